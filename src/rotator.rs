//! Turn-order strategies.
//!
//! A rotator works over a fixed roster of player ids and keeps a cursor on
//! the player whose turn it is.

use crate::error::SessionError;
use crate::session::PlayerId;
use tracing::{debug, instrument};

/// Strategy deciding which player acts next.
pub trait PlayerRotator: Send + std::fmt::Debug {
    /// The roster this rotator works on.
    fn players(&self) -> &[PlayerId];

    /// Replaces the roster and resets the cursor to its start.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyRoster` if `players` is empty.
    fn set_players(&mut self, players: Vec<PlayerId>) -> Result<(), SessionError>;

    /// Cursor position within the roster.
    fn current_index(&self) -> usize;

    /// Id of the player under the cursor.
    fn current_id(&self) -> PlayerId {
        self.players()[self.current_index()]
    }

    /// Advances the cursor and returns the player now under it.
    fn next_player(&mut self) -> PlayerId;

    /// Returns the player under the cursor.
    fn previous_player(&self) -> PlayerId;
}

/// Builds fresh rotators whenever a roster is wired into a session.
pub trait RotatorFactory: Send + Sync + std::fmt::Debug {
    /// Creates a rotator over `players` with its cursor at the roster start.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyRoster` if `players` is empty.
    fn new_rotator(&self, players: Vec<PlayerId>) -> Result<Box<dyn PlayerRotator>, SessionError>;
}

/// Hands the turn from first to last, then back to the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircularRotator {
    players: Vec<PlayerId>,
    cursor: usize,
}

impl CircularRotator {
    /// Creates a rotator with the cursor on the first player.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyRoster` if `players` is empty.
    #[instrument]
    pub fn new(players: Vec<PlayerId>) -> Result<Self, SessionError> {
        if players.is_empty() {
            return Err(SessionError::EmptyRoster);
        }
        Ok(Self { players, cursor: 0 })
    }
}

impl PlayerRotator for CircularRotator {
    fn players(&self) -> &[PlayerId] {
        &self.players
    }

    fn set_players(&mut self, players: Vec<PlayerId>) -> Result<(), SessionError> {
        if players.is_empty() {
            return Err(SessionError::EmptyRoster);
        }
        self.players = players;
        self.cursor = 0;
        Ok(())
    }

    fn current_index(&self) -> usize {
        self.cursor
    }

    #[instrument(skip(self), fields(from = self.cursor))]
    fn next_player(&mut self) -> PlayerId {
        self.cursor = (self.cursor + 1) % self.players.len();
        debug!(to = self.cursor, "Rotated turn");
        self.players[self.cursor]
    }

    fn previous_player(&self) -> PlayerId {
        self.players[self.cursor]
    }
}

/// Factory for [`CircularRotator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CircularRotatorFactory;

impl RotatorFactory for CircularRotatorFactory {
    fn new_rotator(&self, players: Vec<PlayerId>) -> Result<Box<dyn PlayerRotator>, SessionError> {
        Ok(Box::new(CircularRotator::new(players)?))
    }
}
