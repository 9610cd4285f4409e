//! First-class move values.
//!
//! A move describes one spatial transition. It carries no player field:
//! whose move it is comes from the rotator, and the rules decide whether
//! the transition is legal.

use super::{Board, Loc, PieceId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A single spatial transition from one cell to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Source cell.
    pub src: Loc,
    /// Destination cell.
    pub dst: Loc,
    /// UI cue: false only when both cells were vacant at construction.
    pub visible: bool,
    /// Piece displaced from the destination, filled in when the move commits.
    pub captured: Option<PieceId>,
}

impl Move {
    /// Creates a visible move.
    #[instrument]
    pub fn new(src: Loc, dst: Loc) -> Self {
        Self {
            src,
            dst,
            visible: true,
            captured: None,
        }
    }

    /// Creates a move against the current board, deriving its visibility.
    #[instrument(skip(board))]
    pub fn on_board(board: &Board, src: Loc, dst: Loc) -> Self {
        let visible = board.holder_at(src).is_some() || board.holder_at(dst).is_some();
        Self {
            visible,
            ..Self::new(src, dst)
        }
    }

    /// Shorthand for `Move::new(Loc::new(sr, sc), Loc::new(dr, dc))`.
    pub fn between(src_row: usize, src_col: usize, dst_row: usize, dst_col: usize) -> Self {
        Self::new(Loc::new(src_row, src_col), Loc::new(dst_row, dst_col))
    }

    /// Returns a copy recording the captured piece.
    pub fn with_captured(mut self, captured: Option<PieceId>) -> Self {
        self.captured = captured;
        self
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)?;
        if let Some(captured) = self.captured {
            write!(f, " x{}", captured)?;
        }
        Ok(())
    }
}
