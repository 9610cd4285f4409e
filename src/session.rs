//! Turn controller for a single board session.
//!
//! A [`GameSession`] owns the board, the roster, the move history and the
//! optional turn timer. Concrete games plug in through [`Rules`]; everything
//! else (turn order, capture bookkeeping, notifications) lives here.

use crate::board::{Board, Loc, Move, Piece, PieceId, Rules};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::events::{
    BoardEventHandler, CustomEvent, Event, EventDispatcher, EventKind, EventListener, ListenerId,
    MoveEvent,
};
use crate::player::{Player, PlayerStats};
use crate::rotator::{CircularRotatorFactory, PlayerRotator, RotatorFactory};
use crate::scheduler::TaskScheduler;
use crate::snapshot::BoardSnapshot;
use crate::timer::TurnTimer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a game session.
pub type SessionId = String;

/// Identifier for a player: its index in the session roster.
pub type PlayerId = usize;

/// Result of submitting a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum MoveOutcome {
    /// The rules accepted the move and it was committed.
    Accepted,
    /// The rules rejected the move; nothing changed.
    Rejected,
    /// The session is over; the move was not looked at.
    SessionFinished,
}

impl MoveOutcome {
    /// Whether the move was committed.
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// A running board game.
pub struct GameSession<R: Rules> {
    id: SessionId,
    board: Board,
    rules: R,
    players: Vec<Player>,
    stats: Vec<PlayerStats>,
    rotator: Option<Box<dyn PlayerRotator>>,
    rotator_factory: Arc<dyn RotatorFactory>,
    history: Vec<Move>,
    events: Arc<EventDispatcher>,
    scheduler: Arc<dyn TaskScheduler>,
    timer: Option<TurnTimer>,
}

impl<R: Rules> GameSession<R> {
    /// Creates a session with no players wired yet.
    ///
    /// Turn order defaults to [`CircularRotatorFactory`].
    #[instrument(skip(id, board, rules, scheduler), fields(session_id))]
    pub fn new(
        id: impl Into<SessionId>,
        board: Board,
        rules: R,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> Self {
        let id = id.into();
        tracing::Span::current().record("session_id", id.as_str());
        info!(
            height = board.height(),
            width = board.width(),
            "Creating game session"
        );
        Self {
            events: Arc::new(EventDispatcher::new(id.clone())),
            id,
            board,
            rules,
            players: Vec::new(),
            stats: Vec::new(),
            rotator: None,
            rotator_factory: Arc::new(CircularRotatorFactory),
            history: Vec::new(),
            scheduler,
            timer: None,
        }
    }

    /// Builds a session from configuration: board, roster and optional timer.
    ///
    /// The timer is attached but not started.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidConfig` if the configuration does not
    /// pass [`SessionConfig::validate`].
    #[instrument(skip(id, config, rules, scheduler))]
    pub fn from_config(
        id: impl Into<SessionId>,
        config: &SessionConfig,
        rules: R,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> Result<Self, SessionError> {
        config.validate().map_err(|e| SessionError::InvalidConfig(e.message))?;
        let board = Board::new(*config.board_height(), *config.board_width());
        let mut session = Self::new(id, board, rules, scheduler);
        let roster = config
            .players()
            .iter()
            .enumerate()
            .map(|(index, name)| Player::new(index, name, *config.pieces_per_player()))
            .collect();
        session.wire_players(roster)?;
        if let Some(timer) = config.timer() {
            session.attach_timer(*timer.frequency(), *timer.initial_time())?;
        }
        Ok(session)
    }

    /// Replaces the rotator factory used by later calls to
    /// [`wire_players`](Self::wire_players).
    pub fn with_rotator_factory(mut self, factory: Arc<dyn RotatorFactory>) -> Self {
        self.rotator_factory = factory;
        self
    }

    // ─────────────────────────────────────────────────────────────
    //  Setup
    // ─────────────────────────────────────────────────────────────

    /// Installs the roster and builds a fresh rotator over it.
    ///
    /// The first player in turn order receives one turn credit and a
    /// [`EventKind::PlayerWire`] event is published. Any previously attached
    /// timer is paused and detached because its clocks belong to the old
    /// roster.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyRoster` for an empty roster and
    /// `SessionError::RosterMismatch` if a player's id is not its index.
    #[instrument(skip(self, players), fields(session_id = %self.id, count = players.len()))]
    pub fn wire_players(&mut self, mut players: Vec<Player>) -> Result<(), SessionError> {
        if players.is_empty() {
            warn!("Refusing empty roster");
            return Err(SessionError::EmptyRoster);
        }
        if let Some((index, player)) = players
            .iter()
            .enumerate()
            .find(|(index, player)| player.id() != index)
        {
            warn!(index, id = player.id(), "Roster id out of place");
            return Err(SessionError::RosterMismatch {
                index,
                id: *player.id(),
            });
        }

        let rotator = self
            .rotator_factory
            .new_rotator(players.iter().map(|player| *player.id()).collect())?;
        let first = rotator.current_id();
        players
            .get_mut(first)
            .ok_or(SessionError::UnknownPlayer(first))?
            .on_turn();

        if let Some(timer) = self.timer.take() {
            debug!("Detaching timer built for previous roster");
            timer.pause();
        }

        self.stats = players
            .iter()
            .map(|player| PlayerStats::new(player.pieces().len()))
            .collect();
        self.players = players;
        self.rotator = Some(rotator);

        info!(first, "Players wired");
        self.events.publish(EventKind::PlayerWire);
        Ok(())
    }

    /// Puts a piece on the board during setup.
    ///
    /// A piece that is already on the board is lifted from its old cell.
    ///
    /// # Errors
    ///
    /// Fails if the owner is not on the roster, the piece was never
    /// allocated or has been captured, the location is off the board or the
    /// cell is taken.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn place_piece(&mut self, piece: PieceId, loc: Loc) -> Result<(), SessionError> {
        let owner = self
            .players
            .get(piece.owner)
            .ok_or(SessionError::UnknownPlayer(piece.owner))?;
        let captured = self
            .stats
            .get(piece.owner)
            .is_some_and(|stats| stats.killed_pieces().contains(&piece));
        if owner.piece(piece.index).is_none() || captured {
            return Err(SessionError::PieceOutOfRange(piece));
        }
        let target = self.board.cell_at(loc).ok_or(SessionError::OutOfBounds {
            row: loc.row,
            col: loc.col,
        })?;
        match target.holder() {
            Some(holder) if holder == piece => return Ok(()),
            Some(_) => {
                return Err(SessionError::CellOccupied {
                    row: loc.row,
                    col: loc.col,
                });
            }
            None => {}
        }

        if let Some(previous) = self.board.find(piece) {
            if let Some(cell) = self.board.cell_at_mut(previous) {
                cell.take();
            }
        }
        if let Some(cell) = self.board.cell_at_mut(loc) {
            cell.set_holder(Some(piece));
        }
        debug!(%piece, %loc, "Piece placed");
        Ok(())
    }

    /// Attaches a countdown clock with `initial_time` units per player.
    ///
    /// The clock is not started; see [`start_timer`](Self::start_timer).
    /// Attaching again replaces (and pauses) the previous clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyRoster` if no players are wired.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn attach_timer(
        &mut self,
        frequency: u32,
        initial_time: u32,
    ) -> Result<&TurnTimer, SessionError> {
        if self.players.is_empty() {
            return Err(SessionError::EmptyRoster);
        }
        let timer = TurnTimer::new(
            self.players.len(),
            frequency,
            Arc::clone(&self.scheduler),
            Arc::clone(&self.events),
        );
        timer.reset_all(initial_time);
        if let Some(previous) = self.timer.replace(timer) {
            previous.pause();
        }
        info!(players = self.players.len(), "Timer attached");
        self.timer.as_ref().ok_or(SessionError::NoTimer)
    }

    /// Starts the clock for the player whose turn it is.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoTimer` without an attached timer and
    /// `SessionError::NoActivePlayer` before players are wired.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn start_timer(&self) -> Result<(), SessionError> {
        let timer = self.timer.as_ref().ok_or(SessionError::NoTimer)?;
        let current = self.current_player_id().ok_or(SessionError::NoActivePlayer)?;
        timer.start(current)
    }

    // ─────────────────────────────────────────────────────────────
    //  Moves
    // ─────────────────────────────────────────────────────────────

    /// Submits a move on behalf of whoever holds the turn.
    ///
    /// Returns true if the move was committed. Rejected moves and moves on
    /// a finished session change nothing.
    pub fn submit_move(&mut self, mv: Move) -> bool {
        self.submit_move_detailed(mv).is_accepted()
    }

    /// Submits a move and reports why it was or was not committed.
    #[instrument(skip(self, mv), fields(session_id = %self.id, %mv))]
    pub fn submit_move_detailed(&mut self, mv: Move) -> MoveOutcome {
        if self.events.is_dead() {
            debug!("Session finished, move ignored");
            return MoveOutcome::SessionFinished;
        }

        let moved = self.board.holder_at(mv.src);
        let killed = self.board.holder_at(mv.dst);
        if !self.rules.handle(&mut self.board, &mv) {
            debug!("Rules rejected move");
            return MoveOutcome::Rejected;
        }

        self.restore_returned_pieces();
        let captured = killed.filter(|piece| self.board.find(*piece).is_none());
        if let Some(piece) = captured {
            self.record_capture(piece);
        }
        self.history.push(mv.with_captured(captured));

        self.events.publish(EventKind::Move(MoveEvent {
            src: mv.src,
            dst: mv.dst,
            moved,
            killed,
        }));

        self.advance_turn();

        #[cfg(debug_assertions)]
        crate::invariants::assert_invariants(self);

        debug!(moves = self.history.len(), "Move committed");
        MoveOutcome::Accepted
    }

    /// Submits a move for a specific player, enforcing turn credit.
    ///
    /// Returns `Ok(false)` if the rules reject the move or the session is
    /// over; the credit is kept in that case. A committed move consumes one
    /// credit.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownPlayer` if the player is not on the
    /// roster and `SessionError::InvalidTurn` if it holds no turn credit.
    #[instrument(skip(self, mv), fields(session_id = %self.id, %mv))]
    pub fn deliver_move(&mut self, player: PlayerId, mv: Move) -> Result<bool, SessionError> {
        let mover = self
            .players
            .get(player)
            .ok_or(SessionError::UnknownPlayer(player))?;
        if !mover.is_turn() {
            warn!(player, "Player tried to move out of turn");
            return Err(SessionError::InvalidTurn { player });
        }

        let accepted = self.submit_move(mv);
        if accepted {
            if let Some(mover) = self.players.get_mut(player) {
                mover.consume_turn();
            }
        }
        Ok(accepted)
    }

    /// Puts lost pieces that the rules brought back onto the board into
    /// play again.
    fn restore_returned_pieces(&mut self) {
        let board = &self.board;
        for stats in &mut self.stats {
            let returned: Vec<PieceId> = stats
                .killed_pieces()
                .iter()
                .copied()
                .filter(|piece| board.find(*piece).is_some())
                .collect();
            for piece in returned {
                stats.on_restored(piece);
                debug!(%piece, live = stats.live_pieces(), "Piece returned to play");
            }
        }
    }

    fn record_capture(&mut self, piece: PieceId) {
        let Some(stats) = self.stats.get_mut(piece.owner) else {
            warn!(%piece, "Captured piece has no owner stats");
            return;
        };
        if !stats.on_killed(piece) {
            debug!(%piece, "Piece already counted as lost");
            return;
        }
        debug!(%piece, live = stats.live_pieces(), "Piece captured");
        if stats.live_pieces() == 0 {
            info!(loser = piece.owner, "Player lost all pieces");
            self.rules.on_player_lost_all_pieces(piece.owner);
        }
    }

    fn advance_turn(&mut self) {
        let Some(rotator) = self.rotator.as_mut() else {
            debug!("No roster wired, turn stays put");
            return;
        };
        let next = rotator.next_player();
        if let Some(player) = self.players.get_mut(next) {
            player.on_turn();
        }
        if let Some(timer) = &self.timer {
            if let Err(e) = timer.switch_to(next) {
                warn!(error = %e, "Timer could not follow the turn");
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Ending
    // ─────────────────────────────────────────────────────────────

    /// Ends the game in favour of `winner`.
    ///
    /// Publishes [`EventKind::Finish`], which marks the session dead.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn accept_resignation(&self, winner: PlayerId) -> Event {
        info!(winner, "Resignation accepted");
        self.events.publish(EventKind::Finish { winner })
    }

    /// Stops the game without a winner.
    ///
    /// The timer is paused and detached and the session is marked dead. No
    /// event is published.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn stop_game(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.pause();
        }
        self.events.mark_dead();
        info!("Game stopped");
    }

    // ─────────────────────────────────────────────────────────────
    //  Events
    // ─────────────────────────────────────────────────────────────

    /// Registers a listener for this session's events.
    pub fn subscribe(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        self.events.subscribe(listener)
    }

    /// Registers a per-kind handler for this session's events.
    pub fn subscribe_handler<H>(&self, handler: H) -> ListenerId
    where
        H: BoardEventHandler + 'static,
    {
        self.events.subscribe_handler(handler)
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Publishes a game-defined event.
    pub fn publish_other(&self, code: u32, payload: serde_json::Value) -> Event {
        self.events
            .publish(EventKind::Other(CustomEvent::new(code, payload)))
    }

    /// The session's dispatcher.
    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    // ─────────────────────────────────────────────────────────────
    //  Queries
    // ─────────────────────────────────────────────────────────────

    /// Session identifier.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Number of committed moves.
    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    /// Committed move at `index`, oldest first.
    pub fn move_at(&self, index: usize) -> Option<&Move> {
        self.history.get(index)
    }

    /// All committed moves, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Roster entry for a player.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// The roster in id order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Looks up a piece by identity.
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.players.get(id.owner)?.piece(id.index)
    }

    /// Looks up a piece mutably, e.g. to change its status.
    pub fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.players.get_mut(id.owner)?.piece_mut(id.index)
    }

    /// Piece currently on `(row, col)`.
    pub fn piece_at(&self, row: usize, col: usize) -> Option<&Piece> {
        self.board.holder(row, col).and_then(|id| self.piece(id))
    }

    /// Capture bookkeeping for a player.
    pub fn stats(&self, player: PlayerId) -> Option<&PlayerStats> {
        self.stats.get(player)
    }

    /// Remaining clock time for a player, if a timer is attached.
    pub fn timer_remaining(&self, player: PlayerId) -> Option<u32> {
        self.timer.as_ref()?.player_time(player)
    }

    /// The attached timer.
    pub fn timer(&self) -> Option<&TurnTimer> {
        self.timer.as_ref()
    }

    /// Player whose turn it is, once a roster is wired.
    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.rotator.as_ref().map(|rotator| rotator.current_id())
    }

    /// Turn-order strategy in use.
    pub fn rotator(&self) -> Option<&dyn PlayerRotator> {
        self.rotator.as_deref()
    }

    /// Whether the session has finished.
    pub fn is_dead(&self) -> bool {
        self.events.is_dead()
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The game's rules.
    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// Bit-packed copy of the current board occupancy.
    ///
    /// # Errors
    ///
    /// Fails if a piece id cannot be packed.
    pub fn snapshot(&self) -> Result<BoardSnapshot, SessionError> {
        BoardSnapshot::build_from(self)
    }
}

impl<R: Rules> std::fmt::Debug for GameSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("height", &self.board.height())
            .field("width", &self.board.width())
            .field("players", &self.players.len())
            .field("moves", &self.history.len())
            .field("current", &self.current_player_id())
            .field("dead", &self.is_dead())
            .finish()
    }
}
