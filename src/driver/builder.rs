//! Builder pattern for request construction.
//!
//! Provides a fluent API for configuring and creating [`HttpRequest`]
//! instances.
//!
//! # Example
//!
//! ```no_run
//! use request_connection::{Connection, HttpRequestBuilder, SimulatedTransport};
//!
//! # async fn example() -> request_connection::Result<()> {
//! let request = HttpRequestBuilder::new("https://example.com/items")
//!     .method("POST")
//!     .body(r#"{"name":"item"}"#)
//!     .header("Content-Type", "application/json")
//!     .timeout(10_000)
//!     .open_immediately()
//!     .build(SimulatedTransport::new())?;
//!
//! println!("state: {}", request.state());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;

use crate::connection::Listener;
use crate::error::Result;
use crate::protocol::{EventKind, RequestBody};
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::transport::Transport;

use super::core::HttpRequest;
use super::options::{RequestOptions, parse_url};

// ============================================================================
// HttpRequestBuilder
// ============================================================================

/// Builder for configuring an [`HttpRequest`].
///
/// Without an explicit [`scheduler`](Self::scheduler), events are dispatched
/// by a [`TokioScheduler`] on the current runtime.
#[derive(Clone)]
pub struct HttpRequestBuilder {
    /// Target address.
    url: String,
    /// Options collected so far.
    options: RequestOptions,
    /// Event dispatcher.
    scheduler: Option<Arc<dyn Scheduler>>,
}

// ============================================================================
// HttpRequestBuilder Implementation
// ============================================================================

impl HttpRequestBuilder {
    /// Creates a builder for a request to `url` with default options.
    #[inline]
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            options: RequestOptions::default(),
            scheduler: None,
        }
    }

    /// Replaces all options collected so far.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the request method (`GET`, `POST`, `PUT`, `DELETE`).
    #[inline]
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.options = self.options.with_method(method);
        self
    }

    /// Sets the request body.
    #[inline]
    #[must_use]
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.options = self.options.with_body(body);
        self
    }

    /// Adds a header. `Value::Null` marks it as not set.
    #[inline]
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options = self.options.with_header(name, value);
        self
    }

    /// Replaces the header object.
    #[inline]
    #[must_use]
    pub fn headers(mut self, headers: Value) -> Self {
        self.options = self.options.with_headers(headers);
        self
    }

    /// Sets the response type (`arraybuffer`, `blob`, `document`, `json`,
    /// `text`).
    #[inline]
    #[must_use]
    pub fn response_type(mut self, response_type: impl Into<String>) -> Self {
        self.options = self.options.with_response_type(response_type);
        self
    }

    /// Sets the timeout in milliseconds; 0 disables it.
    #[inline]
    #[must_use]
    pub fn timeout(mut self, timeout_ms: i64) -> Self {
        self.options = self.options.with_timeout(timeout_ms);
        self
    }

    /// Registers a listener at construction time.
    #[inline]
    #[must_use]
    pub fn on(mut self, kind: EventKind, callback: Listener) -> Self {
        self.options = self.options.with_listener(kind.as_str(), callback);
        self
    }

    /// Registers a listener by kind name; unknown names fail the build.
    #[inline]
    #[must_use]
    pub fn listener(mut self, event_type: impl Into<String>, callback: Listener) -> Self {
        self.options = self.options.with_listener(event_type, callback);
        self
    }

    /// Opens the request as the last step of the build.
    #[inline]
    #[must_use]
    pub fn open_immediately(mut self) -> Self {
        self.options = self.options.with_open();
        self
    }

    /// Sets the scheduler dispatching events.
    #[inline]
    #[must_use]
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Builds the request over `transport`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfiguration`](crate::Error::InvalidConfiguration)
    ///   if the URL or an option is rejected
    /// - [`Error::Scheduler`](crate::Error::Scheduler) if no scheduler was set
    ///   and no tokio runtime is running
    pub fn build<T: Transport>(self, transport: T) -> Result<Arc<HttpRequest<T>>> {
        self.build_with(move || transport)
    }

    /// Builds the request, creating the transport only once validation
    /// passed.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn build_with<T, F>(self, make_transport: F) -> Result<Arc<HttpRequest<T>>>
    where
        T: Transport,
        F: FnOnce() -> T,
    {
        let url = parse_url(&self.url)?;
        let config = self.options.validate()?;

        let scheduler = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler::new()?),
        };

        Ok(HttpRequest::with_config(
            url,
            config,
            scheduler,
            make_transport,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
