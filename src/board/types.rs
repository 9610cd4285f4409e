//! Core spatial types: locations, pieces, cells and the board grid.

use crate::error::SessionError;
use crate::session::PlayerId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A cell coordinate on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Loc {
    /// Row (y), counted from the top.
    pub row: usize,
    /// Column (x), counted from the left.
    pub col: usize,
}

impl Loc {
    /// Creates a new location.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Packs the location into a single 64-bit value.
    ///
    /// The column lives in the upper 32 bits and the row in the lower 32 bits.
    /// Coordinates wider than 32 bits are truncated.
    pub fn pack(self) -> u64 {
        ((self.col as u64 & 0xFFFF_FFFF) << 32) | (self.row as u64 & 0xFFFF_FFFF)
    }

    /// Recovers a location from [`Loc::pack`] output.
    pub fn unpack(packed: u64) -> Self {
        Self {
            row: (packed & 0xFFFF_FFFF) as usize,
            col: (packed >> 32) as usize,
        }
    }
}

impl std::fmt::Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Identity of a piece: its owner and its slot in the owner's piece array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId {
    /// Owning player.
    pub owner: PlayerId,
    /// Index into the owner's piece array.
    pub index: usize,
}

impl PieceId {
    /// Creates a new piece id.
    pub fn new(owner: PlayerId, index: usize) -> Self {
        Self { owner, index }
    }
}

impl std::fmt::Display for PieceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.owner, self.index)
    }
}

/// A game piece.
///
/// The identity never changes. The status is game-specific (alive, captured,
/// promoted, ...) and starts at [`Piece::DEFAULT_STATUS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    id: PieceId,
    status: u32,
}

impl Piece {
    /// Status every piece starts with.
    pub const DEFAULT_STATUS: u32 = 0;

    /// Creates a piece with the default status.
    pub fn new(id: PieceId) -> Self {
        Self {
            id,
            status: Self::DEFAULT_STATUS,
        }
    }

    /// Returns the piece identity.
    pub fn id(&self) -> PieceId {
        self.id
    }

    /// Returns the owning player.
    pub fn owner(&self) -> PlayerId {
        self.id.owner
    }

    /// Returns the index in the owner's piece array.
    pub fn index(&self) -> usize {
        self.id.index
    }

    /// Returns the current status.
    pub fn status(&self) -> u32 {
        self.status
    }

    /// Updates the status.
    pub fn set_status(&mut self, status: u32) {
        self.status = status;
    }
}

/// A spatial unit of the board. Holds at most one piece reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    holder: Option<PieceId>,
}

impl Cell {
    /// Returns the occupying piece, if any.
    pub fn holder(&self) -> Option<PieceId> {
        self.holder
    }

    /// Replaces the occupant and returns the previous one.
    pub fn set_holder(&mut self, holder: Option<PieceId>) -> Option<PieceId> {
        std::mem::replace(&mut self.holder, holder)
    }

    /// Removes and returns the occupant.
    pub fn take(&mut self) -> Option<PieceId> {
        self.holder.take()
    }

    /// Checks whether the cell is vacant.
    pub fn is_empty(&self) -> bool {
        self.holder.is_none()
    }
}

/// Rectangular grid of cells, stored in row-major order.
///
/// Every cell is allocated at construction, so any in-bounds lookup succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    height: usize,
    width: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates an empty board with `height` rows and `width` columns.
    #[instrument]
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            cells: vec![Cell::default(); height * width],
        }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Checks whether the board has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Checks whether `(row, col)` lies on the board.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width
    }

    /// Converts a location to its row-major offset.
    pub fn offset_of(&self, row: usize, col: usize) -> Option<usize> {
        self.contains(row, col).then(|| row * self.width + col)
    }

    /// Converts a row-major offset back into a location.
    pub fn loc_of(&self, offset: usize) -> Option<Loc> {
        (offset < self.cells.len()).then(|| Loc::new(offset / self.width, offset % self.width))
    }

    /// Returns the cell at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.offset_of(row, col).map(|offset| &self.cells[offset])
    }

    /// Returns the cell at `(row, col)` mutably.
    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.offset_of(row, col).map(|offset| &mut self.cells[offset])
    }

    /// Returns the cell at a location.
    pub fn cell_at(&self, loc: Loc) -> Option<&Cell> {
        self.cell(loc.row, loc.col)
    }

    /// Returns the cell at a location mutably.
    pub fn cell_at_mut(&mut self, loc: Loc) -> Option<&mut Cell> {
        self.cell_mut(loc.row, loc.col)
    }

    /// Returns the cell at a row-major offset.
    pub fn cell_by_offset(&self, offset: usize) -> Option<&Cell> {
        self.cells.get(offset)
    }

    /// Returns the cell at a row-major offset mutably.
    pub fn cell_by_offset_mut(&mut self, offset: usize) -> Option<&mut Cell> {
        self.cells.get_mut(offset)
    }

    /// Returns the occupant of `(row, col)`, if any.
    pub fn holder(&self, row: usize, col: usize) -> Option<PieceId> {
        self.cell(row, col).and_then(Cell::holder)
    }

    /// Returns the occupant of a location, if any.
    pub fn holder_at(&self, loc: Loc) -> Option<PieceId> {
        self.holder(loc.row, loc.col)
    }

    /// Moves whatever sits on `src` onto `dst` and returns what `dst` held before.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OutOfBounds` if either location is off the board.
    /// The board is left untouched in that case.
    pub fn relocate(&mut self, src: Loc, dst: Loc) -> Result<Option<PieceId>, SessionError> {
        let src_offset = self.offset_of(src.row, src.col).ok_or(SessionError::OutOfBounds {
            row: src.row,
            col: src.col,
        })?;
        let dst_offset = self.offset_of(dst.row, dst.col).ok_or(SessionError::OutOfBounds {
            row: dst.row,
            col: dst.col,
        })?;
        if src_offset == dst_offset {
            return Ok(None);
        }
        let moving = self.cells[src_offset].take();
        Ok(self.cells[dst_offset].set_holder(moving))
    }

    /// Finds the location currently holding `piece`.
    pub fn find(&self, piece: PieceId) -> Option<Loc> {
        self.cells
            .iter()
            .position(|cell| cell.holder() == Some(piece))
            .and_then(|offset| self.loc_of(offset))
    }

    /// Iterates over all cells with their locations, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Loc, &Cell)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(offset, cell)| (Loc::new(offset / width, offset % width), cell))
    }

    /// Formats the board as rows of `owner.index` tokens, `.` for vacant cells.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..self.height {
            let line = (0..self.width)
                .map(|col| match self.holder(row, col) {
                    Some(piece) => format!("{}.{}", piece.owner, piece.index),
                    None => ".".to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ");
            result.push_str(&line);
            if row + 1 < self.height {
                result.push('\n');
            }
        }
        result
    }
}
