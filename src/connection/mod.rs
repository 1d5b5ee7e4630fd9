//! Transport-independent connection abstraction.
//!
//! # Lifecycle
//!
//! 1. Created in [`ConnectionState::Init`]
//! 2. `open()` moves to [`ConnectionState::Open`] and raises `open`
//! 3. Transport signals raise `data` while open
//! 4. Completion, failure or abort moves to [`ConnectionState::Closed`] and
//!    raises exactly one of `complete`, `error`, `abort`
//!
//! State is written synchronously by the signal that causes it; listeners
//! run on a later turn through the connection's scheduler.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | State machine, listener registry, dispatch |
//! | `state` | Lifecycle states and transition table |
//! | `traits` | The [`Connection`] capability trait |

// ============================================================================
// Submodules
// ============================================================================

/// State machine, listener registry and dispatch.
pub mod core;

/// Lifecycle states.
pub mod state;

/// The `Connection` trait.
pub mod traits;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{ConnectionCore, Listener, listener};
pub use state::ConnectionState;
pub use traits::Connection;
