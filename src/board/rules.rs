//! Rule predicates supplied by concrete games.

use super::{Board, Move};
use crate::session::PlayerId;
use tracing::{debug, instrument};

/// Game-specific move validation and application.
///
/// `handle` decides whether a move is legal and, if so, reflects it on the
/// board. A rejected move must leave the board exactly as it was.
pub trait Rules: Send {
    /// Validates and applies `mv`. Returns whether the move was accepted.
    fn handle(&mut self, board: &mut Board, mv: &Move) -> bool;

    /// Called after a capture leaves `loser` with no live pieces.
    fn on_player_lost_all_pieces(&mut self, _loser: PlayerId) {}
}

/// Permissive rules: a piece may jump to any cell not held by its own side.
///
/// Landing on an opposing piece captures it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelocateRules;

impl Rules for RelocateRules {
    #[instrument(skip(self, board))]
    fn handle(&mut self, board: &mut Board, mv: &Move) -> bool {
        let Some(moving) = board.holder_at(mv.src) else {
            debug!("No piece on source cell");
            return false;
        };
        if !board.contains(mv.dst.row, mv.dst.col) || mv.src == mv.dst {
            debug!("Destination not reachable");
            return false;
        }
        if board
            .holder_at(mv.dst)
            .is_some_and(|target| target.owner == moving.owner)
        {
            debug!("Destination held by own piece");
            return false;
        }
        board.relocate(mv.src, mv.dst).is_ok()
    }
}

/// Adapts a closure into [`Rules`].
pub struct FnRules<F>(pub F);

impl<F> std::fmt::Debug for FnRules<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnRules")
    }
}

impl<F> Rules for FnRules<F>
where
    F: FnMut(&mut Board, &Move) -> bool + Send,
{
    fn handle(&mut self, board: &mut Board, mv: &Move) -> bool {
        (self.0)(board, mv)
    }
}
