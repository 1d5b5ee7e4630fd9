//! Transport layer.
//!
//! A [`Transport`] performs the network I/O of one request. Drivers own one
//! transport per connection and translate its [`TransportSignal`]s into
//! connection state changes and events.
//!
//! # Contract
//!
//! ```text
//! ┌──────────────────┐   open / headers / send / abort   ┌─────────────┐
//! │   HttpRequest    │──────────────────────────────────►│  Transport  │
//! │  (Connection)    │◄──────────────────────────────────│             │
//! └──────────────────┘  progress / load / error / abort  └─────────────┘
//!                       / timeout signals
//! ```
//!
//! Signals may be raised from inside a transport method (an in-flight
//! `abort()` raises [`TransportSignal::Abort`] before returning), so
//! implementations must not hold internal locks while calling the handler.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `simulated` | In-memory transport driven by the caller |

// ============================================================================
// Submodules
// ============================================================================

/// In-memory transport for tests and demos.
pub mod simulated;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::Result;
use crate::protocol::{Method, RequestBody, ResponseBody, ResponseType};

// ============================================================================
// Re-exports
// ============================================================================

pub use simulated::SimulatedTransport;

// ============================================================================
// Types
// ============================================================================

/// Signal handler callback type.
///
/// Installed by the driver when the connection opens.
pub type SignalHandler = Arc<dyn Fn(TransportSignal) + Send + Sync>;

// ============================================================================
// TransportSignal
// ============================================================================

/// Low-level occurrences reported by a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportSignal {
    /// Response bytes arrived.
    Progress,
    /// Response fully received; status is available.
    Load,
    /// Network-level failure.
    Error,
    /// Request aborted through [`Transport::abort`].
    Abort,
    /// Configured timeout elapsed.
    Timeout,
}

// ============================================================================
// Transport
// ============================================================================

/// The I/O mechanism underneath a connection.
///
/// Methods take `&self`; implementations use interior mutability so that
/// signals can be raised while the driver holds a shared reference.
pub trait Transport: Send + Sync + 'static {
    /// Installs the handler receiving every signal.
    fn set_signal_handler(&self, handler: SignalHandler);

    /// Prepares a request with `method` to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) if the request
    /// cannot be prepared.
    fn open(&self, method: Method, url: &Url) -> Result<()>;

    /// Sets the timeout. [`Duration::ZERO`] disables it.
    fn set_timeout(&self, timeout: Duration);

    /// Adds a request header.
    fn set_request_header(&self, name: &str, value: &str);

    /// Requests a response decoding.
    fn set_response_type(&self, response_type: ResponseType);

    /// Returns the negotiated response decoding.
    ///
    /// `None` means the transport fell back to raw text.
    fn response_type(&self) -> Option<ResponseType>;

    /// Sends the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) if the request
    /// could not be sent.
    fn send(&self, body: Option<&RequestBody>) -> Result<()>;

    /// Aborts an in-flight request, raising [`TransportSignal::Abort`].
    fn abort(&self);

    /// Returns the response status, 0 until a response arrived.
    fn status(&self) -> u16;

    /// Returns the decoded response.
    fn response(&self) -> ResponseBody;
}
