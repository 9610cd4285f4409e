//! Error types for board sessions.

use crate::board::PieceId;
use crate::session::PlayerId;
use derive_more::{Display, Error};
use tracing::instrument;

/// Contract violations raised by the session engine.
///
/// Rejected moves are not errors; they are reported through
/// [`MoveOutcome`](crate::MoveOutcome). Everything here is a caller bug
/// or a malformed setup.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// A player tried to act without holding turn credit.
    #[display("Player {} cannot move: it is not their turn", player)]
    InvalidTurn {
        /// The offending player.
        player: PlayerId,
    },

    /// A roster with no players was supplied.
    #[display("Roster must contain at least one player")]
    EmptyRoster,

    /// A roster entry's id does not match its position.
    #[display("Roster slot {} holds player {}", index, id)]
    RosterMismatch {
        /// Slot in the roster.
        index: usize,
        /// Id found in that slot.
        id: PlayerId,
    },

    /// The player id is not part of the roster.
    #[display("Unknown player {}", _0)]
    UnknownPlayer(#[error(not(source))] PlayerId),

    /// The timer has no active player yet.
    #[display("Timer has no active player")]
    NoActivePlayer,

    /// No timer is attached to the session.
    #[display("No timer attached to session")]
    NoTimer,

    /// A location lies outside the board.
    #[display("Cell ({}, {}) is outside the board", row, col)]
    OutOfBounds {
        /// Row of the location.
        row: usize,
        /// Column of the location.
        col: usize,
    },

    /// A piece index is not allocated for its owner.
    #[display("Piece {} is not allocated", _0)]
    PieceOutOfRange(#[error(not(source))] PieceId),

    /// The target cell already holds a piece.
    #[display("Cell ({}, {}) is already occupied", row, col)]
    CellOccupied {
        /// Row of the cell.
        row: usize,
        /// Column of the cell.
        col: usize,
    },

    /// The piece encodes to the empty-cell sentinel.
    #[display("Piece {} collides with the empty cell marker", _0)]
    ReservedCellCode(#[error(not(source))] PieceId),

    /// Owner or index does not fit in 32 bits.
    #[display("Piece {} does not fit in a packed cell", _0)]
    CellCodeOverflow(#[error(not(source))] PieceId),

    /// The session configuration failed validation.
    #[display("Invalid session config: {}", _0)]
    InvalidConfig(#[error(not(source))] String),

    /// No async runtime is available to drive scheduled work.
    #[display("Scheduler unavailable: {}", _0)]
    SchedulerUnavailable(#[error(not(source))] String),
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("Failed to read config file: {}", err))
    }
}

impl From<toml::de::Error> for ConfigError {
    #[track_caller]
    fn from(err: toml::de::Error) -> Self {
        Self::new(format!("Failed to parse config: {}", err))
    }
}
