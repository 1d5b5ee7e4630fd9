//! The `Connection` capability trait.

// ============================================================================
// Imports
// ============================================================================

use std::time::SystemTime;

use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::{ConnectionId, ListenerId};
use crate::protocol::{ConnectionEvent, EventKind, ResponseBody};

use super::core::{ConnectionCore, Listener};
use super::state::ConnectionState;

// ============================================================================
// Connection
// ============================================================================

/// One request/response exchange with an observable lifecycle.
///
/// Implementors provide the [`ConnectionCore`] and the lifecycle operations;
/// state, listener and dispatch methods are provided on top of the core.
///
/// The trait is object safe: events refer to their source as
/// `dyn Connection`.
pub trait Connection: Send + Sync + 'static {
    /// Returns the shared state machine and listener registry.
    fn core(&self) -> &ConnectionCore;

    /// Starts the exchange.
    ///
    /// # Errors
    ///
    /// The default implementation returns [`Error::NotImplemented`].
    fn open(&self) -> Result<()> {
        Err(Error::not_implemented("open"))
    }

    /// Aborts the exchange.
    ///
    /// # Errors
    ///
    /// The default implementation returns [`Error::NotImplemented`].
    fn close(&self) -> Result<()> {
        Err(Error::not_implemented("close"))
    }

    /// Returns the response status code, 0 if not available.
    fn status(&self) -> u16 {
        0
    }

    /// Returns the decoded response.
    ///
    /// # Errors
    ///
    /// Drivers may fail to decode the response; the default returns
    /// [`ResponseBody::Empty`].
    fn response(&self) -> Result<ResponseBody> {
        Ok(ResponseBody::Empty)
    }

    // ========================================================================
    // Provided
    // ========================================================================

    /// Returns the connection ID.
    fn id(&self) -> ConnectionId {
        self.core().id()
    }

    /// Returns the target URL.
    fn url(&self) -> &Url {
        self.core().url()
    }

    /// Returns the current lifecycle state.
    fn state(&self) -> ConnectionState {
        self.core().state()
    }

    /// Returns when the connection opened.
    fn opened(&self) -> Option<SystemTime> {
        self.core().opened()
    }

    /// Returns when the connection closed.
    fn closed(&self) -> Option<SystemTime> {
        self.core().closed()
    }

    /// Registers `listener` for events of `kind`.
    fn add_listener(&self, kind: EventKind, listener: Listener) -> ListenerId {
        self.core().add_listener(kind, listener)
    }

    /// Registers `listener` for the kind called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEventKind`] if `name` is not a recognized kind.
    fn add_listener_named(&self, name: &str, listener: Listener) -> Result<ListenerId> {
        let kind = name.parse()?;
        Ok(self.add_listener(kind, listener))
    }

    /// Removes a registration. Returns `false` if it was not registered.
    fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        self.core().remove_listener(kind, id)
    }

    /// Returns the number of listeners registered for `kind`.
    fn listener_count(&self, kind: EventKind) -> usize {
        self.core().listener_count(kind)
    }

    /// Invokes every listener for `kind` with `event`, synchronously.
    fn emit(&self, kind: EventKind, event: &ConnectionEvent) {
        self.core().emit(kind, event);
    }
}

// ============================================================================
// Tests
// ============================================================================
