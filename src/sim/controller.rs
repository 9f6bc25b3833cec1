/// Jump controller: turns discrete input into at most one jump in flight.
///
/// A jump is accepted only while the player is on the ground. An accepted
/// jump raises the player and schedules exactly one reversal timer; the
/// reversal brings the player back down and the airborne flag clears when
/// the descent finishes. A second request while airborne is a no-op.

use crate::config::JumpConfig;
use crate::domain::entity::PlayerState;
use super::session::SessionTimer;
use super::timer::{TimerHandle, TimerService};

/// Keys the game reacts to. Everything else is `Other`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ActionKey {
    Space,
    Up,
    Enter,
    Other,
}

/// One discrete input from the input source.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputEvent {
    /// Pointer press, or a gamepad jump button.
    Press,
    Key(ActionKey),
}

impl InputEvent {
    /// Press or one of the designated jump keys.
    pub fn is_jump_trigger(self) -> bool {
        matches!(
            self,
            InputEvent::Press
                | InputEvent::Key(ActionKey::Space)
                | InputEvent::Key(ActionKey::Up)
                | InputEvent::Key(ActionKey::Enter)
        )
    }
}

pub struct JumpController {
    height: u32,
    duration_ms: u64,
    pending: Option<TimerHandle>,
}

impl JumpController {
    pub fn new(cfg: &JumpConfig) -> Self {
        JumpController {
            height: cfg.height,
            duration_ms: cfg.duration_ms,
            pending: None,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// The one outstanding reversal timer, if a jump is rising.
    #[allow(dead_code)]
    pub fn pending(&self) -> Option<TimerHandle> {
        self.pending
    }

    /// Handle an input event. Returns true if a jump started.
    pub fn request_jump(
        &mut self,
        event: InputEvent,
        player: &mut PlayerState,
        timers: &mut TimerService<SessionTimer>,
    ) -> bool {
        if !event.is_jump_trigger() || player.is_airborne {
            return false;
        }
        let now = timers.now();
        player.take_off(self.height, now, self.duration_ms);
        self.pending = Some(timers.schedule_once(self.duration_ms, SessionTimer::JumpReversal));
        true
    }

    /// Reversal timer fired: head back to the ground.
    pub fn on_reversal(&mut self, handle: TimerHandle, player: &mut PlayerState, now: u64) {
        if self.pending != Some(handle) {
            return;
        }
        self.pending = None;
        player.reverse(now, self.duration_ms);
    }

    /// Drop the pending reversal, if any.
    pub fn cancel(&mut self, timers: &mut TimerService<SessionTimer>) {
        if let Some(handle) = self.pending.take() {
            timers.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (JumpController, PlayerState, TimerService<SessionTimer>) {
        (
            JumpController::new(&JumpConfig::default()),
            PlayerState::new(40),
            TimerService::new(),
        )
    }

    #[test]
    fn designated_inputs_trigger_jumps() {
        assert!(InputEvent::Press.is_jump_trigger());
        assert!(InputEvent::Key(ActionKey::Space).is_jump_trigger());
        assert!(InputEvent::Key(ActionKey::Up).is_jump_trigger());
        assert!(InputEvent::Key(ActionKey::Enter).is_jump_trigger());
        assert!(!InputEvent::Key(ActionKey::Other).is_jump_trigger());
    }

    #[test]
    fn accepted_jump_schedules_one_reversal() {
        let (mut ctl, mut player, mut timers) = setup();
        assert!(ctl.request_jump(InputEvent::Key(ActionKey::Space), &mut player, &mut timers));
        assert!(player.is_airborne);
        assert_eq!(player.vertical_offset, 170);
        assert_eq!(timers.pending_count(), 1);
        assert!(ctl.pending().is_some());
    }

    #[test]
    fn other_keys_are_ignored() {
        let (mut ctl, mut player, mut timers) = setup();
        assert!(!ctl.request_jump(InputEvent::Key(ActionKey::Other), &mut player, &mut timers));
        assert_eq!(player, PlayerState::new(40));
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn airborne_request_is_rejected() {
        let (mut ctl, mut player, mut timers) = setup();
        ctl.request_jump(InputEvent::Press, &mut player, &mut timers);
        let first = ctl.pending();
        let snapshot = player.clone();

        assert!(!ctl.request_jump(InputEvent::Press, &mut player, &mut timers));
        assert_eq!(player, snapshot);
        assert_eq!(timers.pending_count(), 1);
        assert_eq!(ctl.pending(), first);
    }

    #[test]
    fn reversal_then_landing_allows_next_jump() {
        let (mut ctl, mut player, mut timers) = setup();
        ctl.request_jump(InputEvent::Press, &mut player, &mut timers);

        let fired = timers.pop_due(300).expect("reversal due at 300");
        assert_eq!(fired.payload, SessionTimer::JumpReversal);
        ctl.on_reversal(fired.handle, &mut player, fired.at);
        assert_eq!(player.vertical_offset, 0);
        assert!(ctl.pending().is_none());

        // Still descending: rejected.
        assert!(!ctl.request_jump(InputEvent::Press, &mut player, &mut timers));
        assert!(timers.pop_due(600).is_none());
        assert!(player.settle(timers.now()));
        assert!(ctl.request_jump(InputEvent::Press, &mut player, &mut timers));
    }

    #[test]
    fn cancel_drops_the_pending_reversal() {
        let (mut ctl, mut player, mut timers) = setup();
        ctl.request_jump(InputEvent::Press, &mut player, &mut timers);
        ctl.cancel(&mut timers);
        assert!(ctl.pending().is_none());
        assert_eq!(timers.pending_count(), 0);
        assert!(timers.pop_due(10_000).is_none());
    }
}
