//! Players, their pieces and per-player bookkeeping.

use crate::board::{Piece, PieceId};
use crate::session::PlayerId;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A participant in a session.
///
/// Pieces are allocated once and never reallocated; captured pieces stay in
/// the array so historical references remain valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Player {
    /// Roster index.
    id: PlayerId,
    /// Display name.
    name: String,
    /// Pieces owned by this player.
    #[getter(skip)]
    pieces: Vec<Piece>,
    /// Outstanding turn grants.
    turn_credit: u32,
}

impl Player {
    /// Creates a player owning `piece_count` pieces indexed `0..piece_count`.
    #[instrument(skip(name), fields(name = %name.as_ref()))]
    pub fn new(id: PlayerId, name: impl AsRef<str>, piece_count: usize) -> Self {
        Self {
            id,
            name: name.as_ref().to_string(),
            pieces: (0..piece_count)
                .map(|index| Piece::new(PieceId::new(id, index)))
                .collect(),
            turn_credit: 0,
        }
    }

    /// Pieces owned by this player.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Returns one of this player's pieces.
    pub fn piece(&self, index: usize) -> Option<&Piece> {
        self.pieces.get(index)
    }

    /// Returns one of this player's pieces mutably.
    pub fn piece_mut(&mut self, index: usize) -> Option<&mut Piece> {
        self.pieces.get_mut(index)
    }

    /// Whether the player may submit a move.
    pub fn is_turn(&self) -> bool {
        self.turn_credit > 0
    }

    /// Grants one turn.
    pub fn on_turn(&mut self) {
        self.turn_credit += 1;
    }

    /// Consumes one turn. Returns false if none was held.
    pub(crate) fn consume_turn(&mut self) -> bool {
        if self.turn_credit == 0 {
            return false;
        }
        self.turn_credit -= 1;
        true
    }
}

/// Derived bookkeeping for one player: live pieces and losses in order.
///
/// Only the controller mutates stats; nothing reads them back into the
/// authoritative board state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    live_pieces: usize,
    lost: Vec<PieceId>,
}

impl PlayerStats {
    /// Creates stats for a player that starts with `piece_count` live pieces.
    pub fn new(piece_count: usize) -> Self {
        Self {
            live_pieces: piece_count,
            lost: Vec::new(),
        }
    }

    /// Records a lost piece. Returns false if it was already recorded.
    pub(crate) fn on_killed(&mut self, piece: PieceId) -> bool {
        if self.lost.contains(&piece) {
            return false;
        }
        self.live_pieces = self.live_pieces.saturating_sub(1);
        self.lost.push(piece);
        true
    }

    /// Returns a lost piece to play. Returns false if it was not lost.
    pub(crate) fn on_restored(&mut self, piece: PieceId) -> bool {
        let Some(position) = self.lost.iter().position(|lost| *lost == piece) else {
            return false;
        };
        self.lost.remove(position);
        self.live_pieces += 1;
        true
    }

    /// Pieces still in play.
    pub fn live_pieces(&self) -> usize {
        self.live_pieces
    }

    /// Pieces lost, in the order they were lost.
    pub fn killed_pieces(&self) -> &[PieceId] {
        &self.lost
    }
}
