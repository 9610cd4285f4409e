//! Synchronous, copy-on-write event fan-out.

use super::{BoardEventHandler, Event, EventKind, EventListener, HandlerAdapter};
use crate::session::SessionId;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, instrument};

/// Handle returned by [`EventDispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("listener-{}", _0)]
pub struct ListenerId(u64);

type ListenerList = Vec<(ListenerId, Arc<dyn EventListener>)>;

/// Fans events out to listeners, in registration order, on the calling thread.
///
/// Each publish iterates the listener list as it stood when the publish
/// began. Listeners may subscribe or unsubscribe from inside a callback;
/// the change takes effect from the next publish.
///
/// The dispatcher also owns the session's terminal flag: publishing
/// [`EventKind::Finish`] marks the session dead.
pub struct EventDispatcher {
    session: SessionId,
    listeners: RwLock<Arc<ListenerList>>,
    next_listener: AtomicU64,
    next_event: AtomicU64,
    dead: AtomicBool,
}

impl EventDispatcher {
    /// Creates a dispatcher for the given session.
    #[instrument]
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            listeners: RwLock::new(Arc::new(Vec::new())),
            next_listener: AtomicU64::new(1),
            next_event: AtomicU64::new(1),
            dead: AtomicBool::new(false),
        }
    }

    /// Session this dispatcher publishes for.
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Registers a listener at the end of the dispatch order.
    #[instrument(skip(self, listener), fields(session_id = %self.session))]
    pub fn subscribe(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let mut next: ListenerList = (**guard).clone();
        next.push((id, listener));
        *guard = Arc::new(next);
        debug!(%id, count = guard.len(), "Listener subscribed");
        id
    }

    /// Registers a per-kind handler.
    pub fn subscribe_handler<H>(&self, handler: H) -> ListenerId
    where
        H: BoardEventHandler + 'static,
    {
        self.subscribe(Arc::new(HandlerAdapter(handler)))
    }

    /// Removes a listener. Returns whether it was registered.
    #[instrument(skip(self), fields(session_id = %self.session))]
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut guard = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        if !guard.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        let next = guard
            .iter()
            .filter(|(existing, _)| *existing != id)
            .cloned()
            .collect::<ListenerList>();
        *guard = Arc::new(next);
        debug!(count = guard.len(), "Listener unsubscribed");
        true
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Publishes an event to every listener registered at this moment.
    ///
    /// Returns the event as delivered.
    #[instrument(skip(self, kind), fields(session_id = %self.session))]
    pub fn publish(&self, kind: EventKind) -> Event {
        let event = Event {
            id: self.next_event.fetch_add(1, Ordering::Relaxed),
            session: self.session.clone(),
            kind,
        };

        let finishing = matches!(event.kind, EventKind::Finish { .. });
        if finishing && !self.dead.swap(true, Ordering::SeqCst) {
            info!(event_id = event.id, "Finish event published, session is now dead");
        }

        let snapshot = Arc::clone(&*self.listeners.read().unwrap_or_else(PoisonError::into_inner));
        debug!(
            event_id = event.id,
            tag = %event.tag(),
            listeners = snapshot.len(),
            "Publishing event"
        );
        for (_, listener) in snapshot.iter() {
            listener.handle_event(&event);
        }
        event
    }

    /// Whether the session has reached its terminal state.
    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::SeqCst)
    }

    /// Marks the session dead without publishing anything.
    pub fn mark_dead(&self) {
        self.dead.store(true, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("session", &self.session)
            .field("listeners", &self.listener_count())
            .field("dead", &self.is_dead())
            .finish()
    }
}
