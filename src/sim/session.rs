/// Session: the complete state of one run through a level.
///
/// ## Lifecycle
///
///   Idle ──any input──▶ Running ──Win/Loss──▶ Ended(outcome)
///
///   - Idle: level laid out, player on the ground, no timers.
///   - Running: the level scrolls, `EvaluateTick` fires every
///     `tick_interval_ms`, jump input goes to the controller.
///   - Ended: terminal. Timers are cancelled on entry, the player and the
///     scroll are frozen. Any input only requests a restart; the shell then
///     builds a fresh `Session`.
///
/// ## Horizontal position
///
/// The scroll offset is derived from elapsed time since start:
///   `scroll = total_width * min(elapsed, duration) / duration`
///   `duration = block_transition_ms * block_count`
/// The player's leading edge is fixed on screen at `player.left`, so its
/// level position is `player.left + scroll`.

use crate::config::GameConfig;
use crate::domain::entity::{ObstacleCursor, PlayerState};
use crate::domain::layout::Level;
use crate::domain::rules::{self, EvalRules, Outcome, TickView, Verdict};
use super::controller::{InputEvent, JumpController};
use super::event::GameEvent;
use super::timer::{TimerHandle, TimerService};

/// Timer payloads the session schedules.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionTimer {
    EvaluateTick,
    JumpReversal,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    Idle,
    Running,
    Ended(Outcome),
}

pub struct Session {
    level: Level,
    /// Position of `level` in the active level list.
    level_index: usize,

    // ── Mutable game state ──
    state: SessionState,
    player: PlayerState,
    cursor: ObstacleCursor,

    // ── Scheduling ──
    timers: TimerService<SessionTimer>,
    jump: JumpController,
    tick_handle: Option<TimerHandle>,
    started_at: Option<u64>,
    ended_at: Option<u64>,
    frozen_scroll: Option<u32>,
    restart_requested: bool,
    ticks: u64,

    // ── Fixed constants ──
    rules: EvalRules,
    player_left: u32,
    block_transition_ms: u64,
    tick_interval_ms: u64,
}

// ── Construction ──

impl Session {
    pub fn new(level: Level, level_index: usize, cfg: &GameConfig) -> Self {
        Session {
            level,
            level_index,
            state: SessionState::Idle,
            player: PlayerState::new(cfg.player.left),
            cursor: ObstacleCursor::new(),
            timers: TimerService::new(),
            jump: JumpController::new(&cfg.jump),
            tick_handle: None,
            started_at: None,
            ended_at: None,
            frozen_scroll: None,
            restart_requested: false,
            ticks: 0,
            rules: EvalRules {
                win_threshold: cfg.rules.win_threshold,
                block_width: cfg.level.block_width,
                player_width: cfg.player.width,
                loss_on_collision: cfg.rules.loss_on_collision,
            },
            player_left: cfg.player.left,
            block_transition_ms: cfg.level.block_transition_ms,
            tick_interval_ms: cfg.rules.tick_interval_ms,
        }
    }
}

// ── Input and time ──

impl Session {
    /// Dispatch one input event on the current state.
    pub fn handle_input(&mut self, event: InputEvent) -> Vec<GameEvent> {
        let mut events = vec![];
        match self.state {
            SessionState::Idle => self.start(&mut events),
            SessionState::Running => {
                if self.jump.request_jump(event, &mut self.player, &mut self.timers) {
                    events.push(GameEvent::Jumped);
                }
            }
            SessionState::Ended(_) => self.restart_requested = true,
        }
        events
    }

    /// Advance the clock by `elapsed_ms`, firing due timers in order.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<GameEvent> {
        let mut events = vec![];
        let until = self.timers.now() + elapsed_ms;

        while let Some(fired) = self.timers.pop_due(until) {
            if self.state != SessionState::Running {
                continue;
            }
            match fired.payload {
                SessionTimer::EvaluateTick => self.evaluate_tick(fired.at, &mut events),
                SessionTimer::JumpReversal => {
                    self.jump.on_reversal(fired.handle, &mut self.player, fired.at);
                }
            }
            self.settle(fired.at, &mut events);
        }
        self.settle(until, &mut events);

        events
    }

    fn settle(&mut self, now: u64, events: &mut Vec<GameEvent>) {
        if self.state == SessionState::Running && self.player.settle(now) {
            events.push(GameEvent::Landed);
        }
    }

    fn start(&mut self, events: &mut Vec<GameEvent>) {
        let now = self.timers.now();
        self.state = SessionState::Running;
        self.started_at = Some(now);
        self.tick_handle = Some(
            self.timers.schedule_repeating(self.tick_interval_ms, SessionTimer::EvaluateTick),
        );
        log::debug!("session started: level {} ({})", self.level_index + 1, self.level.name);
        events.push(GameEvent::Started);
    }

    fn evaluate_tick(&mut self, now: u64, events: &mut Vec<GameEvent>) {
        self.ticks += 1;
        self.player.horizontal_position = self.player_left.saturating_add(self.scroll_at(now));

        let view = TickView {
            player_x: self.player.horizontal_position,
            player_bottom: self.player.elevation_at(now, self.jump.duration_ms()),
            finish_x: self.level.finish_x(),
            barriers: &self.level.barriers,
        };
        let (verdict, cursor) = rules::evaluate(&view, self.cursor, &self.rules);

        if cursor.index() > self.cursor.index() {
            events.push(GameEvent::BarrierPassed { index: self.cursor.index() });
        }
        self.cursor = cursor;

        if let Verdict::End(outcome) = verdict {
            self.finish(outcome, now, events);
        }
    }

    fn finish(&mut self, outcome: Outcome, now: u64, events: &mut Vec<GameEvent>) {
        if let Some(handle) = self.tick_handle.take() {
            self.timers.cancel(handle);
        }
        self.jump.cancel(&mut self.timers);

        self.frozen_scroll = Some(self.scroll_at(now));
        self.player.freeze(now, self.jump.duration_ms());
        self.state = SessionState::Ended(outcome);
        self.ended_at = Some(now);
        log::debug!(
            "session ended: {:?} after {} ticks, {} of {} barriers passed",
            outcome, self.ticks, self.cursor.index(), self.level.barrier_count(),
        );
        events.push(GameEvent::Ended(outcome));
    }
}

// ── Queries (renderer / shell) ──

impl Session {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    #[allow(dead_code)]
    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn cursor(&self) -> ObstacleCursor {
        self.cursor
    }

    #[allow(dead_code)]
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    #[allow(dead_code)]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    /// Level to build next on restart: the next one after a win
    /// (wrapping), the same one otherwise.
    pub fn restart_level_index(&self, level_count: usize) -> usize {
        match self.state {
            SessionState::Ended(Outcome::Win) if level_count > 0 => (self.level_index + 1) % level_count,
            _ => self.level_index,
        }
    }

    /// Current scroll offset of the level in world units.
    pub fn scroll_offset(&self) -> u32 {
        self.scroll_at(self.timers.now())
    }

    /// Player elevation as drawn right now.
    pub fn player_elevation(&self) -> u32 {
        self.player.elevation_at(self.timers.now(), self.jump.duration_ms())
    }

    /// Milliseconds since start, frozen once ended.
    pub fn elapsed_ms(&self) -> u64 {
        match self.started_at {
            Some(start) => self.ended_at.unwrap_or(self.timers.now()) - start,
            None => 0,
        }
    }

    /// Scroll progress in percent.
    pub fn progress_percent(&self) -> u32 {
        if self.level.total_width == 0 {
            return 0;
        }
        (self.scroll_offset() as u64 * 100 / self.level.total_width as u64) as u32
    }

    fn scroll_duration(&self) -> u64 {
        self.block_transition_ms.saturating_mul(self.level.len() as u64)
    }

    fn scroll_at(&self, now: u64) -> u32 {
        if let Some(frozen) = self.frozen_scroll {
            return frozen;
        }
        let start = match self.started_at {
            Some(s) => s,
            None => return 0,
        };
        let duration = self.scroll_duration();
        if duration == 0 {
            return 0;
        }
        let elapsed = now.saturating_sub(start).min(duration);
        (self.level.total_width as u128 * elapsed as u128 / duration as u128) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::layout;
    use crate::sim::controller::ActionKey;
    use crate::sim::level::embedded_levels;

    fn session_with(descriptor: &str, cfg: &GameConfig) -> Session {
        let level = layout::generate("test", descriptor, &cfg.level);
        Session::new(level, 0, cfg)
    }

    fn session(descriptor: &str) -> Session {
        session_with(descriptor, &GameConfig::default())
    }

    /// Advance in tick-sized steps until the session ends or `limit_ms` passes.
    fn run_until_end(s: &mut Session, limit_ms: u64) -> Vec<GameEvent> {
        let mut all = vec![];
        let mut t = 0;
        while t < limit_ms && s.state() == SessionState::Running {
            all.extend(s.advance(40));
            t += 40;
        }
        all
    }

    #[test]
    fn idle_receives_no_ticks() {
        let mut s = session("..|.f");
        assert!(s.advance(5_000).is_empty());
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.ticks(), 0);
        assert_eq!(s.scroll_offset(), 0);
    }

    #[test]
    fn any_input_starts_without_jumping() {
        let mut s = session("........|.....f");
        let events = s.handle_input(InputEvent::Key(ActionKey::Other));
        assert_eq!(events, vec![GameEvent::Started]);
        assert_eq!(s.state(), SessionState::Running);
        assert!(!s.player().is_airborne);

        s.advance(120);
        assert_eq!(s.ticks(), 3);
    }

    #[test]
    fn scroll_follows_elapsed_time() {
        // 5 blocks, 500ms to scroll 150 units
        let mut s = session(".....");
        s.handle_input(InputEvent::Press);
        s.advance(250);
        assert_eq!(s.scroll_offset(), 75);
        assert_eq!(s.progress_percent(), 50);
        assert_eq!(s.player().horizontal_position, 40 + 72);
        s.advance(10_000);
        assert_eq!(s.scroll_offset(), 150);
        assert_eq!(s.elapsed_ms(), 10_250);
    }

    #[test]
    fn short_level_is_won() {
        let mut s = session("....f");
        s.handle_input(InputEvent::Press);
        let events = run_until_end(&mut s, 10_000);
        assert_eq!(s.state(), SessionState::Ended(Outcome::Win));
        assert_eq!(events.last(), Some(&GameEvent::Ended(Outcome::Win)));

        let ticks = s.ticks();
        assert!(s.advance(5_000).is_empty());
        assert_eq!(s.ticks(), ticks);
    }

    #[test]
    fn standing_still_hits_the_first_barrier() {
        let cfg = GameConfig::default();
        let level = embedded_levels().remove(0);
        let mut s = Session::new(layout::generate(&level.name, &level.layout, &cfg.level), 0, &cfg);
        s.handle_input(InputEvent::Press);
        run_until_end(&mut s, 120_000);
        assert_eq!(s.state(), SessionState::Ended(Outcome::Loss));
        assert_eq!(s.cursor().index(), 0);
    }

    #[test]
    fn without_collisions_the_level_is_always_won() {
        let mut cfg = GameConfig::default();
        cfg.rules.loss_on_collision = false;
        let level = embedded_levels().remove(0);
        let mut s = Session::new(layout::generate(&level.name, &level.layout, &cfg.level), 0, &cfg);
        s.handle_input(InputEvent::Press);
        let events = run_until_end(&mut s, 120_000);
        assert_eq!(s.state(), SessionState::Ended(Outcome::Win));
        let passed = events.iter().filter(|e| matches!(e, GameEvent::BarrierPassed { .. })).count();
        assert_eq!(passed, s.level().barrier_count());
        assert_eq!(s.cursor().index(), s.level().barrier_count());
    }

    #[test]
    fn timed_jump_clears_a_barrier() {
        // Barrier at x=240; total width 460 over 1300ms.
        let mut s = session("........|...f");
        s.handle_input(InputEvent::Press);
        for _ in 0..6 {
            s.advance(40);
        }
        assert_eq!(s.now(), 240);
        assert_eq!(s.handle_input(InputEvent::Key(ActionKey::Space)), vec![GameEvent::Jumped]);

        let events = run_until_end(&mut s, 10_000);
        assert!(events.contains(&GameEvent::BarrierPassed { index: 0 }));
        assert_eq!(s.state(), SessionState::Ended(Outcome::Win));
    }

    #[test]
    fn jump_lands_and_can_repeat() {
        let mut cfg = GameConfig::default();
        cfg.rules.loss_on_collision = false;
        let mut s = session_with("..............................f", &cfg);
        s.handle_input(InputEvent::Press);
        assert_eq!(s.handle_input(InputEvent::Press), vec![GameEvent::Jumped]);
        assert!(s.handle_input(InputEvent::Press).is_empty());

        let events = s.advance(600);
        assert!(events.contains(&GameEvent::Landed));
        assert!(!s.player().is_airborne);
        assert_eq!(s.player_elevation(), 0);
        assert_eq!(s.handle_input(InputEvent::Press), vec![GameEvent::Jumped]);
    }

    #[test]
    fn ended_session_ignores_late_reversal() {
        // Barrier within reach on the first tick; jump in flight at the end.
        let mut s = session("..|.f");
        s.handle_input(InputEvent::Press);
        s.handle_input(InputEvent::Press);
        assert!(s.player().is_airborne);

        let events = s.advance(40);
        assert_eq!(events, vec![GameEvent::Ended(Outcome::Loss)]);
        let frozen = s.player().clone();
        let scroll = s.scroll_offset();
        let elevation = s.player_elevation();

        // The reversal would have fired at 300.
        assert!(s.advance(1_000).is_empty());
        assert_eq!(s.player(), &frozen);
        assert_eq!(s.scroll_offset(), scroll);
        assert_eq!(s.player_elevation(), elevation);
        assert_eq!(s.ticks(), 1);
    }

    #[test]
    fn timers_firing_after_the_end_change_nothing() {
        let mut s = session("..|.f");
        s.handle_input(InputEvent::Press);
        s.advance(40);
        assert_eq!(s.state(), SessionState::Ended(Outcome::Loss));
        let player = s.player().clone();
        let cursor = s.cursor();
        let scroll = s.scroll_offset();

        s.timers.schedule_once(10, SessionTimer::JumpReversal);
        s.timers.schedule_repeating(40, SessionTimer::EvaluateTick);
        assert!(s.advance(1_000).is_empty());

        assert_eq!(s.state(), SessionState::Ended(Outcome::Loss));
        assert_eq!(s.ticks(), 1);
        assert_eq!(s.player(), &player);
        assert_eq!(s.cursor(), cursor);
        assert_eq!(s.scroll_offset(), scroll);
    }

    #[test]
    fn slower_levels_stay_winnable() {
        let cfg = GameConfig::from_str_or_default("[level]\nblock_transition_ms = 200\n");
        assert_eq!(cfg.jump.duration_ms, 600);

        let won = (0..3_000u64).step_by(40).any(|jump_at| {
            let mut s = session_with("........|........f", &cfg);
            s.handle_input(InputEvent::Press);
            s.advance(jump_at);
            if s.state() != SessionState::Running {
                return false;
            }
            s.handle_input(InputEvent::Press);
            run_until_end(&mut s, 20_000);
            s.state() == SessionState::Ended(Outcome::Win)
        });
        assert!(won);
    }

    #[test]
    fn ended_input_only_requests_restart() {
        let mut s = session("..|.f");
        s.handle_input(InputEvent::Press);
        s.advance(40);
        assert_eq!(s.state(), SessionState::Ended(Outcome::Loss));
        assert!(!s.restart_requested());

        let before = s.player().clone();
        assert!(s.handle_input(InputEvent::Key(ActionKey::Space)).is_empty());
        assert!(s.restart_requested());
        assert_eq!(s.player(), &before);
        assert_eq!(s.restart_level_index(3), 0);
    }

    #[test]
    fn win_restarts_on_the_next_level() {
        let cfg = GameConfig::default();
        let level = layout::generate("test", "....f", &cfg.level);
        let mut s = Session::new(level, 2, &cfg);
        s.handle_input(InputEvent::Press);
        run_until_end(&mut s, 10_000);
        assert_eq!(s.restart_level_index(3), 0);
        assert_eq!(s.restart_level_index(5), 3);
    }

    #[test]
    fn level_without_barriers_or_finish_never_panics() {
        let mut s = session("....");
        s.handle_input(InputEvent::Press);
        s.advance(60_000);
        assert_eq!(s.state(), SessionState::Running);
        assert_eq!(s.cursor().index(), 0);

        let mut s = session("");
        s.handle_input(InputEvent::Press);
        s.advance(1_000);
        assert_eq!(s.scroll_offset(), 0);
    }
}
