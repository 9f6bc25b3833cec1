/// Game-state evaluation rules, checked in a fixed order every tick.
///
/// Pure function over a borrowed view of the level and player geometry.
/// No side effects: the caller applies the outcome and the new cursor.
///
/// ## Evaluation Order
/// ┌───┬─────────────────────────────────────────┬──────────────────────┐
/// │ # │ Condition                                │ Result               │
/// ├───┼─────────────────────────────────────────┼──────────────────────┤
/// │ 1 │ finish_x - player_x <= win_threshold     │ Win (overrides loss) │
/// │ 2 │ cursor == barrier count                  │ Continue             │
/// │ 3 │ player_x > barrier.x + block_width       │ cursor + 1, Continue │
/// │ 4 │ player_x + player_w >= barrier.x         │                      │
/// │   │   && bottom <= barrier.height            │                      │
/// │   │   && loss_on_collision                   │ Loss                 │
/// │ 5 │ otherwise                                │ Continue             │
/// └───┴─────────────────────────────────────────┴──────────────────────┘
///
/// Row 3 defers the collision check for the next barrier to the following
/// tick, so every barrier is examined at least once before it is skipped.
///
/// Vertical positions are elevations above the ground: the player's bottom
/// edge overlaps a barrier while it is at or below the barrier's top.

use super::entity::ObstacleCursor;
use super::layout::BarrierGeom;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Win,
    Loss,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    Continue,
    End(Outcome),
}

/// Fixed rule constants.
#[derive(Clone, Copy, Debug)]
pub struct EvalRules {
    pub win_threshold: u32,
    pub block_width: u32,
    pub player_width: u32,
    pub loss_on_collision: bool,
}

/// Immutable view of everything one tick needs.
pub struct TickView<'a> {
    /// Player leading edge, level coordinates.
    pub player_x: u32,
    /// Player bottom edge, elevation above the ground.
    pub player_bottom: u32,
    pub finish_x: Option<u32>,
    pub barriers: &'a [BarrierGeom],
}

/// Evaluate one tick. Returns the verdict and the (possibly advanced) cursor.
pub fn evaluate(view: &TickView, cursor: ObstacleCursor, rules: &EvalRules) -> (Verdict, ObstacleCursor) {
    if is_level_completed(view.player_x, view.finish_x, rules.win_threshold) {
        return (Verdict::End(Outcome::Win), cursor);
    }

    let count = view.barriers.len();
    if cursor.is_done(count) {
        return (Verdict::Continue, cursor);
    }

    let barrier = view.barriers[cursor.index()];

    if has_passed(view.player_x, &barrier, rules.block_width) {
        return (Verdict::Continue, cursor.advanced(count));
    }

    if rules.loss_on_collision && collides(view.player_x, view.player_bottom, rules.player_width, &barrier) {
        return (Verdict::End(Outcome::Loss), cursor);
    }

    (Verdict::Continue, cursor)
}

/// Win line reached? Signed distance so overshooting still counts.
pub fn is_level_completed(player_x: u32, finish_x: Option<u32>, threshold: u32) -> bool {
    match finish_x {
        Some(fx) => fx as i64 - player_x as i64 <= threshold as i64,
        None => false,
    }
}

/// Player's leading edge beyond the barrier's trailing edge.
pub fn has_passed(player_x: u32, barrier: &BarrierGeom, block_width: u32) -> bool {
    player_x > barrier.x.saturating_add(block_width)
}

/// Horizontal reach and vertical overlap with the barrier.
pub fn collides(player_x: u32, player_bottom: u32, player_width: u32, barrier: &BarrierGeom) -> bool {
    player_x.saturating_add(player_width) >= barrier.x && player_bottom <= barrier.height
}
