/// Input source: terminal keyboard and mouse.
///
/// Drains all pending crossterm events once per frame and turns them into
/// discrete `InputEvent`s for the session:
///   - mouse button down         → `InputEvent::Press`
///   - Space / Up / Enter        → `InputEvent::Key(..)` (jump keys)
///   - any other key             → `InputEvent::Key(ActionKey::Other)`
///
/// Quit keys (Esc, Ctrl+C) are consumed here and never reach the session.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};

use crate::sim::controller::{ActionKey, InputEvent};

pub struct InputState {
    /// Discrete events collected during the most recent drain, in order.
    events: Vec<InputEvent>,
    quit: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            events: Vec::with_capacity(8),
            quit: false,
        }
    }

    /// Drain all pending terminal events.
    /// Call this once per frame, before advancing the session.
    pub fn drain_events(&mut self) {
        self.events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.push_key(key),
                Ok(Event::Mouse(m)) => {
                    if let MouseEventKind::Down(_) = m.kind {
                        self.events.push(InputEvent::Press);
                    }
                }
                _ => {}
            }
        }
    }

    /// Events from this frame, oldest first.
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    /// Queue an event from another source (gamepad).
    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    // ── Internal ──

    fn push_key(&mut self, key: KeyEvent) {
        // Press only: auto-repeat would restart an ended run instantly.
        if key.kind != KeyEventKind::Press {
            return;
        }
        if is_quit_key(&key) {
            self.quit = true;
            return;
        }
        self.events.push(InputEvent::Key(action_key(key.code)));
    }
}

fn is_quit_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')))
}

/// Map a terminal key to the keys the game distinguishes.
pub fn action_key(code: KeyCode) -> ActionKey {
    match code {
        KeyCode::Char(' ') => ActionKey::Space,
        KeyCode::Up => ActionKey::Up,
        KeyCode::Enter => ActionKey::Enter,
        _ => ActionKey::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn jump_keys_map_to_actions() {
        assert_eq!(action_key(KeyCode::Char(' ')), ActionKey::Space);
        assert_eq!(action_key(KeyCode::Up), ActionKey::Up);
        assert_eq!(action_key(KeyCode::Enter), ActionKey::Enter);
        assert_eq!(action_key(KeyCode::Down), ActionKey::Other);
        assert_eq!(action_key(KeyCode::Char('w')), ActionKey::Other);
    }

    #[test]
    fn quit_keys_do_not_reach_the_session() {
        let mut input = InputState::new();
        input.push_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(input.quit_requested());
        assert!(input.events().is_empty());

        let mut input = InputState::new();
        input.push_key(press(KeyCode::Esc, KeyModifiers::NONE));
        assert!(input.quit_requested());
    }

    #[test]
    fn repeats_and_releases_are_dropped() {
        let mut input = InputState::new();
        let mut repeat = press(KeyCode::Char(' '), KeyModifiers::NONE);
        repeat.kind = KeyEventKind::Repeat;
        input.push_key(repeat);
        let mut release = press(KeyCode::Char(' '), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        input.push_key(release);
        assert!(input.events().is_empty());

        input.push_key(press(KeyCode::Char(' '), KeyModifiers::NONE));
        assert_eq!(input.events(), &[InputEvent::Key(ActionKey::Space)]);
    }
}
