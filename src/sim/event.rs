/// Events emitted by the session.
/// The presentation layer consumes these for sound and messages.

use crate::domain::rules::Outcome;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Started,
    Jumped,
    Landed,
    BarrierPassed { index: usize },
    Ended(Outcome),
}
