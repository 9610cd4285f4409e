//! Placement invariant: a piece occupies at most one cell.

use super::Invariant;
use crate::board::{Board, Rules};
use crate::session::GameSession;
use std::collections::HashSet;

/// Invariant: no piece is referenced by two cells at once.
pub struct UniquePlacementInvariant;

impl Invariant<Board> for UniquePlacementInvariant {
    fn holds(board: &Board) -> bool {
        let mut seen = HashSet::new();
        board
            .iter()
            .filter_map(|(_, cell)| cell.holder())
            .all(|piece| seen.insert(piece))
    }

    fn description() -> &'static str {
        "Every piece occupies at most one cell"
    }
}

impl<R: Rules> Invariant<GameSession<R>> for UniquePlacementInvariant {
    fn holds(session: &GameSession<R>) -> bool {
        <Self as Invariant<Board>>::holds(session.board())
    }

    fn description() -> &'static str {
        <Self as Invariant<Board>>::description()
    }
}
