//! Bit-packed board occupancy snapshots.
//!
//! A snapshot stores one `i64` per cell: the owner in the upper 32 bits and
//! the piece index in the lower 32 bits. `-1` marks an empty cell. Snapshots
//! are immutable; deriving one from a move copies the grid.

use crate::board::{Board, Move, Piece, PieceId, Rules};
use crate::error::SessionError;
use crate::session::GameSession;
use std::sync::Arc;
use tracing::instrument;

/// Packing of a cell occupant into a single `i64`.
///
/// All encoding and decoding goes through here so the empty-marker
/// collision is checked in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellCode;

impl CellCode {
    /// Marker for a vacant cell.
    pub const EMPTY: i64 = -1;

    /// Packs an occupant.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CellCodeOverflow` if the owner or index does
    /// not fit in 32 bits, and `SessionError::ReservedCellCode` if the pair
    /// would produce the empty marker.
    pub fn encode(piece: PieceId) -> Result<i64, SessionError> {
        let owner = u32::try_from(piece.owner).map_err(|_| SessionError::CellCodeOverflow(piece))?;
        let index = u32::try_from(piece.index).map_err(|_| SessionError::CellCodeOverflow(piece))?;
        let packed = ((u64::from(owner) << 32) | u64::from(index)) as i64;
        if packed == Self::EMPTY {
            return Err(SessionError::ReservedCellCode(piece));
        }
        Ok(packed)
    }

    /// Unpacks a cell value; `None` for the empty marker.
    pub fn decode(code: i64) -> Option<PieceId> {
        if code == Self::EMPTY {
            return None;
        }
        let bits = code as u64;
        Some(PieceId::new((bits >> 32) as usize, (bits & 0xFFFF_FFFF) as usize))
    }

    /// Packs an optional occupant.
    ///
    /// # Errors
    ///
    /// See [`CellCode::encode`].
    pub fn encode_holder(holder: Option<PieceId>) -> Result<i64, SessionError> {
        holder.map_or(Ok(Self::EMPTY), Self::encode)
    }
}

/// Immutable point-in-time copy of board occupancy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    height: usize,
    width: usize,
    cells: Arc<[i64]>,
}

impl BoardSnapshot {
    /// Captures the occupancy of a session's board.
    ///
    /// # Errors
    ///
    /// Fails if an occupant cannot be packed (see [`CellCode::encode`]).
    #[instrument(skip(session), fields(session_id = %session.id()))]
    pub fn build_from<R: Rules>(session: &GameSession<R>) -> Result<Self, SessionError> {
        Self::from_board(session.board())
    }

    /// Captures the occupancy of a board.
    ///
    /// # Errors
    ///
    /// Fails if an occupant cannot be packed (see [`CellCode::encode`]).
    pub fn from_board(board: &Board) -> Result<Self, SessionError> {
        let cells = board
            .iter()
            .map(|(_, cell)| CellCode::encode_holder(cell.holder()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            height: board.height(),
            width: board.width(),
            cells: cells.into(),
        })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raw packed value of a cell.
    pub fn code_at(&self, row: usize, col: usize) -> Option<i64> {
        (row < self.height && col < self.width).then(|| self.cells[row * self.width + col])
    }

    /// Occupant of a cell at the time of the snapshot.
    pub fn piece_id_at(&self, row: usize, col: usize) -> Option<PieceId> {
        self.code_at(row, col).and_then(CellCode::decode)
    }

    /// Resolves the occupant of a cell against the session's pieces.
    pub fn piece_at<'s, R: Rules>(
        &self,
        session: &'s GameSession<R>,
        row: usize,
        col: usize,
    ) -> Option<&'s Piece> {
        self.piece_id_at(row, col).and_then(|id| session.piece(id))
    }

    /// Derives the snapshot that follows `mv`, optionally resizing the grid.
    ///
    /// The receiver is never modified. Cells outside the old grid start
    /// empty and cells outside the new grid are dropped. The source cell is
    /// cleared and its old value written to the destination; endpoints
    /// outside the new grid are ignored.
    #[instrument(skip(self))]
    pub fn apply_move(&self, mv: &Move, new_height: usize, new_width: usize) -> Self {
        let mut cells = vec![CellCode::EMPTY; new_height * new_width];
        for row in 0..new_height.min(self.height) {
            for col in 0..new_width.min(self.width) {
                cells[row * new_width + col] = self.cells[row * self.width + col];
            }
        }

        let moving = self.code_at(mv.src.row, mv.src.col).unwrap_or(CellCode::EMPTY);
        let in_new = |row: usize, col: usize| {
            (row < new_height && col < new_width).then(|| row * new_width + col)
        };
        if let Some(src) = in_new(mv.src.row, mv.src.col) {
            cells[src] = CellCode::EMPTY;
        }
        if let Some(dst) = in_new(mv.dst.row, mv.dst.col) {
            cells[dst] = moving;
        }

        Self {
            height: new_height,
            width: new_width,
            cells: cells.into(),
        }
    }

    /// Derives the snapshot that follows `mv` on a grid of the same size.
    pub fn after(&self, mv: &Move) -> Self {
        self.apply_move(mv, self.height, self.width)
    }
}
