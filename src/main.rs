/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use config::GameConfig;
use sim::controller::InputEvent;
use sim::level::{build_level, load_levels, LevelDef};
use sim::session::Session;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{self, SoundEngine};

fn main() {
    env_logger::init();

    let config = GameConfig::load();
    let levels = load_levels(&config);

    let mut renderer = Renderer::new(&config);

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&levels, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }
}

fn game_loop(
    levels: &[LevelDef],
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let frame_sleep = Duration::from_millis(config.ui.frame_ms);

    let mut session = new_session(levels, config.start_level - 1, config);
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        gp.update();
        if gp.quit_pressed() {
            kb.request_quit();
        }
        if gp.jump_pressed() {
            kb.push(InputEvent::Press);
        }
        if kb.quit_requested() {
            break;
        }

        // Bring the clock up to date before input so jumps start "now".
        let elapsed = last_frame.elapsed().as_millis() as u64;
        if elapsed > 0 {
            // Keep the sub-millisecond remainder for the next frame.
            last_frame += Duration::from_millis(elapsed);
            let events = session.advance(elapsed);
            sound::play_events(sound, &events);
        }

        for &event in kb.events() {
            let events = session.handle_input(event);
            sound::play_events(sound, &events);
        }

        if session.restart_requested() {
            let next = session.restart_level_index(levels.len());
            session = new_session(levels, next, config);
            last_frame = Instant::now();
        }

        renderer.render(&session, levels.len())?;
        std::thread::sleep(frame_sleep);
    }

    Ok(())
}

/// Build a fresh session for level `index` (clamped).
fn new_session(levels: &[LevelDef], index: usize, config: &GameConfig) -> Session {
    let (level, index) = build_level(levels, index, config);
    log::info!("level {}: {} ({} barriers)", index + 1, level.name, level.barrier_count());
    Session::new(level, index, config)
}
