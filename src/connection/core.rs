//! Shared connection state and listener registry.
//!
//! [`ConnectionCore`] is the part of every connection that does not depend on
//! the transport: the lifecycle state machine, its timestamps, the listener
//! registry and event dispatch. Drivers embed one and expose it through
//! [`Connection::core`].
//!
//! # Dispatch
//!
//! [`ConnectionCore::dispatch`] builds the event immediately and hands the
//! listener invocation to the scheduler. The listener list is read when the
//! task runs, so a listener registered in the same turn as the signal still
//! receives the event.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::SystemTime;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};
use url::Url;

use crate::identifiers::{ConnectionId, ListenerId};
use crate::protocol::{ConnectionEvent, EventKind};
use crate::scheduler::Scheduler;

use super::state::ConnectionState;
use super::traits::Connection;

// ============================================================================
// Types
// ============================================================================

/// Listener callback type.
///
/// Called with every event of the kind it was registered for.
pub type Listener = Arc<dyn Fn(&ConnectionEvent) + Send + Sync>;

/// Registrations per kind, in insertion order.
type ListenerMap = FxHashMap<EventKind, Vec<(ListenerId, Listener)>>;

/// Wraps a closure into a [`Listener`].
#[inline]
pub fn listener<F>(callback: F) -> Listener
where
    F: Fn(&ConnectionEvent) + Send + Sync + 'static,
{
    Arc::new(callback)
}

// ============================================================================
// Lifecycle
// ============================================================================

#[derive(Debug, Default)]
struct Lifecycle {
    state: ConnectionState,
    opened: Option<SystemTime>,
    closed: Option<SystemTime>,
}

// ============================================================================
// ConnectionCore
// ============================================================================

/// State machine, listener registry and dispatcher of one connection.
pub struct ConnectionCore {
    id: ConnectionId,
    url: Url,
    lifecycle: Mutex<Lifecycle>,
    /// Shared with deferred dispatch tasks.
    listeners: Arc<Mutex<ListenerMap>>,
    next_listener_id: AtomicU64,
    source: Weak<dyn Connection>,
    scheduler: Arc<dyn Scheduler>,
}

impl ConnectionCore {
    /// Creates a core in state [`ConnectionState::Init`].
    ///
    /// `source` is the connection embedding this core; it becomes the
    /// [`ConnectionEvent::source`] of every dispatched event.
    #[must_use]
    pub fn new(url: Url, source: Weak<dyn Connection>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            id: ConnectionId::generate(),
            url,
            lifecycle: Mutex::new(Lifecycle::default()),
            listeners: Arc::new(Mutex::new(ListenerMap::default())),
            next_listener_id: AtomicU64::new(1),
            source,
            scheduler,
        }
    }

    /// Returns the connection ID.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the target URL.
    #[inline]
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.lifecycle.lock().state
    }

    /// Returns when the connection entered [`ConnectionState::Open`].
    #[inline]
    #[must_use]
    pub fn opened(&self) -> Option<SystemTime> {
        self.lifecycle.lock().opened
    }

    /// Returns when the connection entered [`ConnectionState::Closed`].
    #[inline]
    #[must_use]
    pub fn closed(&self) -> Option<SystemTime> {
        self.lifecycle.lock().closed
    }

    // ========================================================================
    // State Machine
    // ========================================================================

    /// Moves to `next` and stamps the matching timestamp.
    ///
    /// Returns `false` without any change when the current state does not
    /// allow `next`. This is the only place state is written.
    pub fn transition(&self, next: ConnectionState) -> bool {
        self.transition_where(|_| true, next)
    }

    /// Moves from `expected` to `next`; rejected if the state is anything
    /// other than `expected`.
    pub fn transition_from(&self, expected: ConnectionState, next: ConnectionState) -> bool {
        self.transition_where(|current| current == expected, next)
    }

    fn transition_where(
        &self,
        precondition: impl FnOnce(ConnectionState) -> bool,
        next: ConnectionState,
    ) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        let current = lifecycle.state;

        if !precondition(current) || !current.can_transition_to(next) {
            trace!(connection_id = %self.id, %current, %next, "Transition rejected");
            return false;
        }

        let now = SystemTime::now();
        match next {
            ConnectionState::Open => lifecycle.opened = Some(now),
            ConnectionState::Closed => lifecycle.closed = Some(now),
            ConnectionState::Init => {}
        }
        lifecycle.state = next;

        debug!(connection_id = %self.id, from = %current, to = %next, "State transition");
        true
    }

    // ========================================================================
    // Listener Registry
    // ========================================================================

    /// Registers `listener` for `kind`, after any existing registrations.
    pub fn add_listener(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId::new(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .entry(kind)
            .or_default()
            .push((id, listener));

        trace!(connection_id = %self.id, %kind, listener_id = %id, "Listener added");
        id
    }

    /// Removes a registration. Returns `false` if it was not registered.
    pub fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(registered) = listeners.get_mut(&kind) else {
            return false;
        };

        let before = registered.len();
        registered.retain(|(registered_id, _)| *registered_id != id);
        let removed = registered.len() != before;

        if removed {
            trace!(connection_id = %self.id, %kind, listener_id = %id, "Listener removed");
        }
        removed
    }

    /// Returns the number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.lock().get(&kind).map_or(0, Vec::len)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Invokes every listener for `kind` with `event`, synchronously.
    pub fn emit(&self, kind: EventKind, event: &ConnectionEvent) {
        invoke_listeners(&self.listeners, kind, event);
    }

    /// Creates an event of `kind` now and emits it on a later turn.
    pub fn dispatch(&self, kind: EventKind) {
        let event = ConnectionEvent::from_weak(kind, self.source.clone(), self.id);
        let listeners = Arc::clone(&self.listeners);

        trace!(connection_id = %self.id, %kind, "Event scheduled");
        self.scheduler.defer(Box::new(move || {
            invoke_listeners(&listeners, kind, &event);
        }));
    }
}

/// Calls the listeners registered for `kind` at this moment.
///
/// The registry lock is released before any callback runs, so callbacks may
/// register listeners or close the connection.
fn invoke_listeners(listeners: &Mutex<ListenerMap>, kind: EventKind, event: &ConnectionEvent) {
    let snapshot: Vec<Listener> = listeners
        .lock()
        .get(&kind)
        .map(|registered| registered.iter().map(|(_, l)| Arc::clone(l)).collect())
        .unwrap_or_default();

    trace!(connection_id = %event.connection_id(), %kind, count = snapshot.len(), "Emitting event");
    for listener in snapshot {
        listener(event);
    }
}

// ============================================================================
// Tests
// ============================================================================
