//! Listener traits and adapters.

use super::{CustomEvent, Event, EventKind, MoveEvent, TimerTick};
use crate::session::PlayerId;

/// Receives every event a session publishes.
pub trait EventListener: Send + Sync {
    /// Handles one event. Called synchronously on the publishing thread.
    fn handle_event(&self, event: &Event);
}

/// Per-kind event handling with no-op defaults.
///
/// Implement only the handlers you care about, then register the value
/// through [`HandlerAdapter`] (or `EventDispatcher::subscribe_handler`).
/// Dispatch is an exhaustive match over [`EventKind`], so adding a kind is a
/// compile error here rather than a silent fallback.
pub trait BoardEventHandler: Send + Sync {
    /// The roster has been wired into the session.
    fn on_player_wire(&self, _event: &Event) {}

    /// A move was committed.
    fn on_move(&self, _event: &Event, _mv: &MoveEvent) {}

    /// The game finished.
    fn on_finish(&self, _event: &Event, _winner: PlayerId) {}

    /// A player's clock ticked.
    fn on_timer_tick(&self, _event: &Event, _tick: &TimerTick) {}

    /// A player ran out of time.
    ///
    /// The timer does not advance the turn on its own; listeners decide
    /// whether to force a rotation or end the game.
    fn on_elimination(&self, _event: &Event, _player: PlayerId) {}

    /// A game-specific event.
    fn on_other(&self, _event: &Event, _other: &CustomEvent) {}

    /// Routes an event to the matching handler.
    fn dispatch(&self, event: &Event) {
        match &event.kind {
            EventKind::PlayerWire => self.on_player_wire(event),
            EventKind::Move(mv) => self.on_move(event, mv),
            EventKind::Finish { winner } => self.on_finish(event, *winner),
            EventKind::TimerTick(tick) => self.on_timer_tick(event, tick),
            EventKind::Elimination { player, .. } => self.on_elimination(event, *player),
            EventKind::Other(other) => self.on_other(event, other),
        }
    }
}

/// Turns a [`BoardEventHandler`] into an [`EventListener`].
#[derive(Debug, Clone, Default)]
pub struct HandlerAdapter<H>(pub H);

impl<H: BoardEventHandler> EventListener for HandlerAdapter<H> {
    fn handle_event(&self, event: &Event) {
        self.0.dispatch(event);
    }
}

/// Turns a closure into an [`EventListener`].
pub struct FnListener<F>(pub F);

impl<F> std::fmt::Debug for FnListener<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnListener")
    }
}

impl<F> EventListener for FnListener<F>
where
    F: Fn(&Event) + Send + Sync,
{
    fn handle_event(&self, event: &Event) {
        (self.0)(event);
    }
}
