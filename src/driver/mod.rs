//! HTTP request driver.
//!
//! The concrete [`Connection`](crate::Connection) bound to a request/response
//! [`Transport`](crate::Transport).
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HttpRequest`] | Connection driving one request |
//! | [`HttpRequestBuilder`] | Fluent configuration builder |
//! | [`RequestOptions`] | Unvalidated option bag |
//! | [`RequestConfig`] | Validated, immutable configuration |
//! | [`ListenerSpec`] | Listener registered at construction |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for requests.
pub mod builder;

/// Core request driver.
pub mod core;

/// Request options and validation.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::HttpRequest;
pub use builder::HttpRequestBuilder;
pub use options::{
    DEFAULT_ACCEPT, HeaderList, ListenerSpec, MAX_TIMEOUT_MS, RequestConfig, RequestOptions,
};
