//! Connection event types.
//!
//! Every lifecycle occurrence of a connection is delivered to listeners as a
//! [`ConnectionEvent`]. Events carry no payload: listeners read the current
//! `state`, `status` or `response` through [`ConnectionEvent::source`].
//!
//! # Event Kinds
//!
//! | Kind | Name | Raised when |
//! |------|------|-------------|
//! | [`EventKind::Open`] | `open` | request sent to the transport |
//! | [`EventKind::Data`] | `data` | transport reports progress |
//! | [`EventKind::Error`] | `error` | status >= 400, network error, timeout |
//! | [`EventKind::Complete`] | `complete` | load with status < 400 |
//! | [`EventKind::Abort`] | `abort` | closed by the caller |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;

// ============================================================================
// EventKind
// ============================================================================

/// The fixed vocabulary of connection events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Request handed to the transport.
    Open,
    /// Response data arriving.
    Data,
    /// Request failed.
    Error,
    /// Request finished successfully.
    Complete,
    /// Request aborted by the caller.
    Abort,
}

impl EventKind {
    /// All kinds, in lifecycle order.
    pub const ALL: [EventKind; 5] = [
        EventKind::Open,
        EventKind::Data,
        EventKind::Error,
        EventKind::Complete,
        EventKind::Abort,
    ];

    /// Returns the wire name of the kind.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Data => "data",
            Self::Error => "error",
            Self::Complete => "complete",
            Self::Abort => "abort",
        }
    }

    /// Returns `true` if `name` is one of the recognized kind names.
    #[inline]
    #[must_use]
    pub fn includes(name: &str) -> bool {
        name.parse::<Self>().is_ok()
    }

    /// Returns `true` if the kind ends the lifecycle.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Error | Self::Complete | Self::Abort)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| Error::invalid_event_kind(name))
    }
}

// ============================================================================
// ConnectionEvent
// ============================================================================

/// An immutable record of one lifecycle occurrence.
///
/// Holds a non-owning reference to the connection that raised it, so a
/// listener kept alive past its connection sees [`source`](Self::source)
/// return `None` instead of extending the connection's lifetime.
#[derive(Clone)]
pub struct ConnectionEvent {
    kind: EventKind,
    source: Weak<dyn Connection>,
    connection_id: ConnectionId,
    timestamp: SystemTime,
}

impl ConnectionEvent {
    /// Creates an event raised by `source`.
    #[must_use]
    pub fn new(kind: EventKind, source: &Arc<dyn Connection>) -> Self {
        Self::from_weak(kind, Arc::downgrade(source), source.id())
    }

    /// Creates an event from a kind name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEventKind`] if `name` is not a recognized kind.
    pub fn from_name(name: &str, source: &Arc<dyn Connection>) -> Result<Self> {
        let kind = name.parse()?;
        Ok(Self::new(kind, source))
    }

    /// Creates an event from an already downgraded source.
    pub(crate) fn from_weak(
        kind: EventKind,
        source: Weak<dyn Connection>,
        connection_id: ConnectionId,
    ) -> Self {
        Self {
            kind,
            source,
            connection_id,
            timestamp: SystemTime::now(),
        }
    }

    /// Returns the event kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the connection that raised the event, if it is still alive.
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<Arc<dyn Connection>> {
        self.source.upgrade()
    }

    /// Returns the ID of the connection that raised the event.
    #[inline]
    #[must_use]
    pub const fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Returns the creation time of the event.
    #[inline]
    #[must_use]
    pub const fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}

impl fmt::Debug for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionEvent")
            .field("kind", &self.kind)
            .field("connection_id", &self.connection_id)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use url::Url;

    use crate::connection::ConnectionCore;
    use crate::scheduler::ManualScheduler;

    struct Bare {
        core: ConnectionCore,
    }

    impl Connection for Bare {
        fn core(&self) -> &ConnectionCore {
            &self.core
        }
    }

    fn bare() -> Arc<dyn Connection> {
        let url = Url::parse("https://example.com/").expect("valid url");
        Arc::new_cyclic(|weak: &Weak<Bare>| {
            let source: Weak<dyn Connection> = weak.clone();
            Bare {
                core: ConnectionCore::new(url, source, Arc::new(ManualScheduler::new())),
            }
        })
    }

    #[test]
    fn test_kind_names() {
        let names: Vec<_> = EventKind::ALL.iter().map(EventKind::as_str).collect();
        assert_eq!(names, ["open", "data", "error", "complete", "abort"]);
    }

    #[test]
    fn test_includes() {
        assert!(EventKind::includes("complete"));
        assert!(!EventKind::includes("progress"));
        assert!(!EventKind::includes("OPEN"));
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "load".parse::<EventKind>().unwrap_err();
        assert!(matches!(err, Error::InvalidEventKind { ref kind } if kind == "load"));
    }

    #[test]
    fn test_kind_serde_lowercase() {
        let json = serde_json::to_string(&EventKind::Complete).expect("serialize");
        assert_eq!(json, "\"complete\"");
        let kind: EventKind = serde_json::from_str("\"abort\"").expect("parse");
        assert_eq!(kind, EventKind::Abort);
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(!EventKind::Open.is_terminal());
        assert!(!EventKind::Data.is_terminal());
        assert!(EventKind::Error.is_terminal());
        assert!(EventKind::Complete.is_terminal());
        assert!(EventKind::Abort.is_terminal());
    }

    #[test]
    fn test_event_references_source() {
        let conn = bare();
        let event = ConnectionEvent::new(EventKind::Open, &conn);

        assert_eq!(event.kind(), EventKind::Open);
        assert_eq!(event.connection_id(), conn.id());
        let source = event.source().expect("source alive");
        assert!(Arc::ptr_eq(&source, &conn));
    }

    #[test]
    fn test_event_from_name() {
        let conn = bare();
        assert!(ConnectionEvent::from_name("data", &conn).is_ok());
        assert!(ConnectionEvent::from_name("progress", &conn).is_err());
    }

    #[test]
    fn test_event_does_not_own_source() {
        let conn = bare();
        let event = ConnectionEvent::new(EventKind::Abort, &conn);
        drop(conn);
        assert!(event.source().is_none());
    }
}
