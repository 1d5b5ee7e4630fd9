//! Request Connection - transport-agnostic request/response connections.
//!
//! This library models a single request/response exchange as a
//! [`Connection`] with a small lifecycle and an event listener registry.
//! [`HttpRequest`] binds that lifecycle to an HTTP [`Transport`].
//!
//! # Architecture
//!
//! - **Lifecycle**: `INIT -> OPEN -> CLOSED`, never backwards
//! - **Events**: `open`, `data`, `error`, `complete`, `abort`
//! - **Dispatch**: state changes are synchronous, listeners run later on a
//!   [`Scheduler`]
//!
//! Every event carries a non-owning reference to the connection that
//! raised it, so listeners can read its state and response without
//! keeping it alive.
//!
//! # Quick Start
//!
//! ```no_run
//! use request_connection::{Connection, EventKind, HttpRequestBuilder, Result, listener};
//! # use request_connection::SimulatedTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     # let transport = SimulatedTransport::new();
//!     let request = HttpRequestBuilder::new("https://example.com/api/items")
//!         .method("GET")
//!         .timeout(5_000)
//!         .on(EventKind::Complete, listener(|event| {
//!             if let Some(source) = event.source() {
//!                 println!("status {}", source.status());
//!             }
//!         }))
//!         .build(transport)?;
//!
//!     request.open()?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connection`] | [`Connection`] trait, lifecycle and listener registry |
//! | [`driver`] | HTTP driver: [`HttpRequest`] and its options |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Events, methods and body types |
//! | [`scheduler`] | Deferred event dispatch |
//! | [`transport`] | Transport abstraction and simulated backend |

// ============================================================================
// Modules
// ============================================================================

/// Connection lifecycle and listener registry.
///
/// - [`Connection`] - Trait implemented by every driver
/// - [`ConnectionCore`] - Shared state and listener bookkeeping
/// - [`ConnectionState`] - `INIT`, `OPEN`, `CLOSED`
pub mod connection;

/// HTTP request driver.
///
/// Use [`HttpRequestBuilder`] or [`HttpRequest::new`] to create a request.
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for connections and listeners.
pub mod identifiers;

/// Event and request value types.
pub mod protocol;

/// Deferred task scheduling.
pub mod scheduler;

/// Transport abstraction.
///
/// The driver talks to the network only through [`Transport`].
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Connection types
pub use connection::{Connection, ConnectionCore, ConnectionState, Listener, listener};

// Driver types
pub use driver::{HttpRequest, HttpRequestBuilder, ListenerSpec, RequestConfig, RequestOptions};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionId, ListenerId};

// Protocol types
pub use protocol::{ConnectionEvent, EventKind, Method, RequestBody, ResponseBody, ResponseType};

// Scheduler types
pub use scheduler::{ManualScheduler, Scheduler, Task, TokioScheduler};

// Transport types
pub use transport::{SignalHandler, SimulatedTransport, Transport, TransportSignal};
