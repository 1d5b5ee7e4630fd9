//! Error types for request connections.
//!
//! Only configuration and programming mistakes are reported through
//! [`Error`]. Transport failures (network error, HTTP status >= 400,
//! timeout, abort) are never returned from an operation; they arrive as
//! [`EventKind::Error`](crate::EventKind::Error) or
//! [`EventKind::Abort`](crate::EventKind::Abort) events instead.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::InvalidConfiguration`], [`Error::InvalidEventKind`] |
//! | Contract | [`Error::NotImplemented`] |
//! | Collaborators | [`Error::Transport`], [`Error::Scheduler`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Construction options failed validation.
    ///
    /// The connection is never created when this is returned.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of the rejected option.
        message: String,
    },

    /// Event kind name outside the fixed vocabulary.
    #[error("Invalid event kind: {kind:?}")]
    InvalidEventKind {
        /// The rejected kind name.
        kind: String,
    },

    // ========================================================================
    // Contract Errors
    // ========================================================================
    /// Lifecycle operation without a transport driver behind it.
    #[error("Not implemented: {operation}")]
    NotImplemented {
        /// Name of the operation.
        operation: &'static str,
    },

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// The transport refused a request.
    ///
    /// Drivers turn this into an error event; it only escapes through
    /// [`Transport`](crate::Transport) implementations themselves.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the refusal.
        message: String,
    },

    /// No scheduler could be created for event dispatch.
    #[error("Scheduler error: {message}")]
    Scheduler {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid configuration error.
    #[inline]
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Creates an invalid event kind error.
    #[inline]
    pub fn invalid_event_kind(kind: impl Into<String>) -> Self {
        Self::InvalidEventKind { kind: kind.into() }
    }

    /// Creates a not implemented error.
    #[inline]
    pub fn not_implemented(operation: &'static str) -> Self {
        Self::NotImplemented { operation }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a scheduler error.
    #[inline]
    pub fn scheduler(message: impl Into<String>) -> Self {
        Self::Scheduler {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the error was caused by caller-supplied options.
    #[inline]
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. } | Self::InvalidEventKind { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
