//! Session events and their fan-out.
//!
//! Events are immutable notifications. History is the durable record of
//! moves; events are only its notification shadow.

mod dispatcher;
mod listener;

pub use dispatcher::{EventDispatcher, ListenerId};
pub use listener::{BoardEventHandler, EventListener, FnListener, HandlerAdapter};

use crate::board::{Loc, PieceId};
use crate::session::{PlayerId, SessionId};
use serde::{Deserialize, Serialize};
use strum::EnumDiscriminants;

/// A notification published by a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Sequence number, unique within the owning session.
    pub id: u64,
    /// The session that published the event.
    pub session: SessionId,
    /// What happened.
    pub kind: EventKind,
}

impl Event {
    /// Returns the kind tag, useful for logging and filtering.
    pub fn tag(&self) -> EventTag {
        EventTag::from(&self.kind)
    }
}

/// Payload of an [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumDiscriminants)]
#[strum_discriminants(name(EventTag))]
#[strum_discriminants(derive(Hash, Serialize, Deserialize, strum::Display))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The roster was wired into the session and play can begin.
    PlayerWire,
    /// A move was committed.
    Move(MoveEvent),
    /// The game is over. Publishing this marks the session dead.
    Finish {
        /// Winning player.
        winner: PlayerId,
    },
    /// A player's clock went down by one unit.
    TimerTick(TimerTick),
    /// A player's clock reached zero.
    Elimination {
        /// The player whose time ran out.
        player: PlayerId,
        /// Timer generation the expiry belongs to.
        generation: u64,
    },
    /// Game-specific extension.
    Other(CustomEvent),
}

/// A committed move, with the occupants the cells held just before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEvent {
    /// Source cell.
    pub src: Loc,
    /// Destination cell.
    pub dst: Loc,
    /// Piece that stood on the source cell.
    pub moved: Option<PieceId>,
    /// Piece that stood on the destination cell.
    pub killed: Option<PieceId>,
}

impl MoveEvent {
    /// Source row.
    pub fn source_row(&self) -> usize {
        self.src.row
    }

    /// Source column.
    pub fn source_column(&self) -> usize {
        self.src.col
    }

    /// Destination row.
    pub fn dest_row(&self) -> usize {
        self.dst.row
    }

    /// Destination column.
    pub fn dest_column(&self) -> usize {
        self.dst.col
    }

    /// Whether the destination held a piece.
    pub fn pebble_killed(&self) -> bool {
        self.killed.is_some()
    }
}

/// One unit of a player's clock elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerTick {
    /// Player whose clock ticked.
    pub player: PlayerId,
    /// Remaining time after the tick.
    pub new_value: u32,
    /// Timer generation that produced the tick.
    pub generation: u64,
}

/// A game-defined event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    /// Game-defined discriminator.
    pub code: u32,
    /// Free-form payload.
    pub payload: serde_json::Value,
}

impl CustomEvent {
    /// Creates a custom event.
    pub fn new(code: u32, payload: serde_json::Value) -> Self {
        Self { code, payload }
    }
}
