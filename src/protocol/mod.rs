//! Event and request vocabulary.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`EventKind`] | Fixed set of lifecycle event kinds |
//! | [`ConnectionEvent`] | Immutable record delivered to listeners |
//! | [`Method`] | Allowed request methods |
//! | [`ResponseType`] | Allowed response decodings |
//! | [`RequestBody`] | Payload sent with a request |
//! | [`ResponseBody`] | Payload decoded by a transport |

// ============================================================================
// Submodules
// ============================================================================

/// Connection event types.
pub mod event;

/// Request and response value types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{ConnectionEvent, EventKind};
pub use request::{Method, RequestBody, ResponseBody, ResponseType};
