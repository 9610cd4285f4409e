//! Strictly Board library - turn-based board game sessions
//!
//! This library manages whose turn it is, validates and records moves,
//! broadcasts game events, runs per-player countdown clocks and exposes
//! compact board snapshots. Concrete games supply their rules through
//! [`Rules`].
//!
//! # Architecture
//!
//! - **Board**: grid of cells holding piece references, plus moves
//! - **Events**: synchronous, registration-ordered fan-out to listeners
//! - **Rotator**: pluggable turn order over a fixed roster
//! - **Timer**: per-player countdown driven by an injected scheduler
//! - **Snapshot**: immutable bit-packed copies of board occupancy
//! - **Session**: the turn controller tying it all together
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use strictly_board::{
//!     Board, GameSession, Loc, ManualScheduler, Move, PieceId, Player, RelocateRules,
//! };
//!
//! # fn example() -> Result<(), strictly_board::SessionError> {
//! let mut session = GameSession::new(
//!     "example",
//!     Board::new(3, 3),
//!     RelocateRules,
//!     Arc::new(ManualScheduler::new()),
//! );
//! session.wire_players(vec![Player::new(0, "White", 1), Player::new(1, "Black", 1)])?;
//! session.place_piece(PieceId::new(0, 0), Loc::new(0, 0))?;
//!
//! assert!(session.submit_move(Move::between(0, 0, 1, 1)));
//! assert_eq!(session.current_player_id(), Some(1));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod error;
mod player;
mod rotator;
mod scheduler;
mod session;
mod snapshot;
mod timer;

// Public module declarations
pub mod board;
pub mod events;
pub mod invariants;

// Crate-level exports - Board
pub use board::geometry;
pub use board::{Board, Cell, FnRules, Loc, Move, Piece, PieceId, RelocateRules, Rules};

// Crate-level exports - Events
pub use events::{
    BoardEventHandler, CustomEvent, Event, EventDispatcher, EventKind, EventListener, EventTag,
    FnListener, HandlerAdapter, ListenerId, MoveEvent, TimerTick,
};

// Crate-level exports - Session
pub use config::{SessionConfig, TimerConfig};
pub use error::{ConfigError, SessionError};
pub use player::{Player, PlayerStats};
pub use rotator::{CircularRotator, CircularRotatorFactory, PlayerRotator, RotatorFactory};
pub use scheduler::{ManualScheduler, Task, TaskKind, TaskScheduler, TokioScheduler};
pub use session::{GameSession, MoveOutcome, PlayerId, SessionId};
pub use snapshot::{BoardSnapshot, CellCode};
pub use timer::{TimerPhase, TurnTimer, format_hms};
