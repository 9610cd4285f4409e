//! Turn order invariant: the rotator tracks the wired roster.

use super::Invariant;
use crate::board::Rules;
use crate::session::GameSession;

/// Invariant: the rotator works over exactly the wired roster and its
/// cursor points into it.
pub struct TurnOrderInvariant;

impl<R: Rules> Invariant<GameSession<R>> for TurnOrderInvariant {
    fn holds(session: &GameSession<R>) -> bool {
        match session.rotator() {
            None => session.players().is_empty(),
            Some(rotator) => {
                rotator.players().len() == session.players().len()
                    && rotator.current_index() < rotator.players().len()
                    && rotator
                        .players()
                        .iter()
                        .all(|id| session.player(*id).is_some())
            }
        }
    }

    fn description() -> &'static str {
        "Rotator covers the roster and its cursor is in range"
    }
}
