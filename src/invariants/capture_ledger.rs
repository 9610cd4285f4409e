//! Capture bookkeeping invariant.

use super::Invariant;
use crate::board::Rules;
use crate::session::GameSession;

/// Invariant: for every player, live pieces plus lost pieces equals the
/// pieces allocated at wiring time.
pub struct CaptureLedgerInvariant;

impl<R: Rules> Invariant<GameSession<R>> for CaptureLedgerInvariant {
    fn holds(session: &GameSession<R>) -> bool {
        session.players().iter().all(|player| {
            session.stats(*player.id()).is_some_and(|stats| {
                stats.live_pieces() + stats.killed_pieces().len() == player.pieces().len()
            })
        })
    }

    fn description() -> &'static str {
        "Live plus lost pieces equals allocated pieces for every player"
    }
}
