/// Entities: the player and the obstacle cursor.
///
/// The player's jump is a fixed linear transition (up for `duration_ms`,
/// then back down for the same time), not a simulated trajectory.
/// `vertical_offset` is the transition's target; `elevation_at` gives the
/// in-between value the renderer draws and the evaluator reads.

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
    /// Leading edge in level coordinates.
    pub horizontal_position: u32,
    /// Target ground-relative offset (0 = on the ground).
    pub vertical_offset: u32,
    pub is_airborne: bool,
    /// Elevation the current transition started from.
    transition_from: u32,
    /// Clock time (ms) the current transition started.
    transition_started_at: u64,
    /// Time of the last reversal; airborne ends one transition later.
    landing_at: Option<u64>,
}

impl PlayerState {
    pub fn new(horizontal_position: u32) -> Self {
        PlayerState {
            horizontal_position,
            vertical_offset: 0,
            is_airborne: false,
            transition_from: 0,
            transition_started_at: 0,
            landing_at: None,
        }
    }

    /// Elevation above the ground at `now`, linearly interpolated.
    pub fn elevation_at(&self, now: u64, transition_ms: u64) -> u32 {
        let from = self.transition_from as i64;
        let to = self.vertical_offset as i64;
        let elapsed = now.saturating_sub(self.transition_started_at);
        if transition_ms == 0 || elapsed >= transition_ms {
            return self.vertical_offset;
        }
        let delta = (to - from) * elapsed as i64 / transition_ms as i64;
        (from + delta).max(0) as u32
    }

    /// Begin a transition towards `target` at `now`.
    pub fn move_to(&mut self, target: u32, now: u64, transition_ms: u64) {
        self.transition_from = self.elevation_at(now, transition_ms);
        self.vertical_offset = target;
        self.transition_started_at = now;
    }

    /// Start a jump. Caller checks `is_airborne` first.
    pub fn take_off(&mut self, height: u32, now: u64, transition_ms: u64) {
        self.is_airborne = true;
        self.landing_at = None;
        self.move_to(height, now, transition_ms);
    }

    /// Head back to the ground; landing completes one transition later.
    pub fn reverse(&mut self, now: u64, transition_ms: u64) {
        self.move_to(0, now, transition_ms);
        self.landing_at = Some(now + transition_ms);
    }

    /// Clear the airborne flag once the descent has finished.
    /// Returns true on the call that lands the player.
    pub fn settle(&mut self, now: u64) -> bool {
        match self.landing_at {
            Some(t) if self.is_airborne && now >= t => {
                self.is_airborne = false;
                self.landing_at = None;
                true
            }
            _ => false,
        }
    }

    /// Stop any transition, keeping the elevation reached at `now`.
    pub fn freeze(&mut self, now: u64, transition_ms: u64) {
        let elevation = self.elevation_at(now, transition_ms);
        self.transition_from = elevation;
        self.vertical_offset = elevation;
        self.transition_started_at = now;
        self.landing_at = None;
    }
}

/// Index of the next barrier not yet passed. Only ever moves forward.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ObstacleCursor {
    next_barrier_index: usize,
}

impl ObstacleCursor {
    pub fn new() -> Self {
        ObstacleCursor::default()
    }

    pub fn index(self) -> usize {
        self.next_barrier_index
    }

    /// True once every barrier has been passed.
    pub fn is_done(self, barrier_count: usize) -> bool {
        self.next_barrier_index >= barrier_count
    }

    /// Step past the current barrier, saturating at `barrier_count`.
    pub fn advanced(self, barrier_count: usize) -> Self {
        ObstacleCursor {
            next_barrier_index: (self.next_barrier_index + 1).min(barrier_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_rises_linearly_then_holds() {
        let mut p = PlayerState::new(40);
        p.take_off(170, 1000, 300);
        assert!(p.is_airborne);
        assert_eq!(p.elevation_at(1000, 300), 0);
        assert_eq!(p.elevation_at(1150, 300), 85);
        assert_eq!(p.elevation_at(1300, 300), 170);
        assert_eq!(p.elevation_at(5000, 300), 170);
    }

    #[test]
    fn reversal_descends_and_lands() {
        let mut p = PlayerState::new(40);
        p.take_off(170, 0, 300);
        p.reverse(300, 300);
        assert_eq!(p.vertical_offset, 0);
        assert_eq!(p.elevation_at(450, 300), 85);
        assert!(!p.settle(599));
        assert!(p.is_airborne);
        assert!(p.settle(600));
        assert!(!p.is_airborne);
        assert_eq!(p.elevation_at(600, 300), 0);
    }

    #[test]
    fn freeze_holds_current_elevation() {
        let mut p = PlayerState::new(40);
        p.take_off(170, 0, 300);
        p.freeze(150, 300);
        assert_eq!(p.elevation_at(150, 300), 85);
        assert_eq!(p.elevation_at(10_000, 300), 85);
        assert!(!p.settle(10_000));
    }

    #[test]
    fn cursor_saturates_at_barrier_count() {
        let c = ObstacleCursor::new();
        assert_eq!(c.index(), 0);
        let c = c.advanced(2).advanced(2).advanced(2);
        assert_eq!(c.index(), 2);
        assert!(c.is_done(2));
        assert!(ObstacleCursor::new().is_done(0));
    }
}
