//! Spatial model: the board, its cells, pieces and moves.

mod action;
pub mod geometry;
mod rules;
mod types;

pub use action::Move;
pub use rules::{FnRules, RelocateRules, Rules};
pub use types::{Board, Cell, Loc, Piece, PieceId};
