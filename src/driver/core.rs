//! HTTP request driver.
//!
//! [`HttpRequest`] binds the connection lifecycle to a [`Transport`]. It maps
//! every transport signal to a state change and exactly one event:
//!
//! | Signal | State | Event |
//! |--------|-------|-------|
//! | progress | unchanged | `data` |
//! | load, status < 400 | `CLOSED` | `complete` |
//! | load, status >= 400 | `CLOSED` | `error` |
//! | error | `CLOSED` | `error` |
//! | timeout | `CLOSED` | `error` |
//! | abort | `CLOSED` | `abort` |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use request_connection::{
//!     Connection, ConnectionState, EventKind, HttpRequestBuilder, ManualScheduler,
//!     SimulatedTransport, listener,
//! };
//!
//! let scheduler = Arc::new(ManualScheduler::new());
//! let transport = SimulatedTransport::new();
//!
//! let request = HttpRequestBuilder::new("https://example.com/items/1")
//!     .on(EventKind::Complete, listener(|event| {
//!         let source = event.source().expect("request alive");
//!         println!("done: {}", source.status());
//!     }))
//!     .scheduler(scheduler.clone())
//!     .build(transport.clone())?;
//!
//! request.open()?;
//! transport.complete(200, r#"{"id":1}"#);
//! scheduler.run_until_idle();
//!
//! assert_eq!(request.state(), ConnectionState::Closed);
//! # Ok::<(), request_connection::Error>(())
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::connection::{Connection, ConnectionCore, ConnectionState};
use crate::error::Result;
use crate::protocol::{EventKind, ResponseBody, ResponseType};
use crate::scheduler::Scheduler;
use crate::transport::{Transport, TransportSignal};

use super::options::{RequestConfig, RequestOptions, parse_url};

// ============================================================================
// Constants
// ============================================================================

/// Lowest status reported as an `error` event.
const ERROR_STATUS_THRESHOLD: u16 = 400;

/// Header list for opening without extra headers.
const NO_HEADERS: [(&str, Option<&str>); 0] = [];

// ============================================================================
// HttpRequest
// ============================================================================

/// A connection performing one HTTP request over a [`Transport`].
///
/// Always handled through an `Arc`: transport signals and dispatched events
/// refer back to the request without owning it.
pub struct HttpRequest<T: Transport> {
    core: ConnectionCore,
    config: RequestConfig,
    transport: T,
    /// Set by a close that lands while the request is open.
    abort_requested: AtomicBool,
    self_ref: Weak<Self>,
}

// ============================================================================
// HttpRequest - Constructors
// ============================================================================

impl<T: Transport> HttpRequest<T> {
    /// Validates `options` and creates a request to `url`.
    ///
    /// `make_transport` runs only after validation passed. Listeners from the
    /// options are registered before the request can raise any event, and
    /// the request is opened last when the `open` option is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`](crate::Error::InvalidConfiguration)
    /// if `url` or any option is rejected.
    pub fn new<F>(
        url: &str,
        options: RequestOptions,
        scheduler: Arc<dyn Scheduler>,
        make_transport: F,
    ) -> Result<Arc<Self>>
    where
        F: FnOnce() -> T,
    {
        let url = parse_url(url)?;
        let config = options.validate()?;
        Ok(Self::with_config(url, config, scheduler, make_transport))
    }

    /// Creates a request from an already validated configuration.
    pub fn with_config<F>(
        url: Url,
        mut config: RequestConfig,
        scheduler: Arc<dyn Scheduler>,
        make_transport: F,
    ) -> Arc<Self>
    where
        F: FnOnce() -> T,
    {
        let listeners = config.take_listeners();
        let transport = make_transport();

        let request = Arc::new_cyclic(|weak: &Weak<Self>| {
            let source: Weak<dyn Connection> = weak.clone();
            Self {
                core: ConnectionCore::new(url, source, scheduler),
                config,
                transport,
                abort_requested: AtomicBool::new(false),
                self_ref: weak.clone(),
            }
        });

        for (kind, listener) in listeners {
            request.core.add_listener(kind, listener);
        }

        debug!(
            connection_id = %request.core.id(),
            method = %request.config.method(),
            url = %request.core.url(),
            "Request created"
        );

        if request.config.opens_immediately() {
            request.open_with(NO_HEADERS);
        }

        request
    }
}

// ============================================================================
// HttpRequest - Lifecycle
// ============================================================================

impl<T: Transport> HttpRequest<T> {
    /// Opens the request, layering `extra_headers` over the configured ones.
    ///
    /// Does nothing unless the request is still in [`ConnectionState::Init`].
    /// Headers whose value is `None` are not set. Transport refusals surface
    /// as an `error` event.
    pub fn open_with<I, K, V>(&self, extra_headers: I) -> &Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let connection_id = self.core.id();

        if !self
            .core
            .transition_from(ConnectionState::Init, ConnectionState::Open)
        {
            trace!(%connection_id, state = %self.core.state(), "Open ignored");
            return self;
        }

        let weak = self.self_ref.clone();
        self.transport.set_signal_handler(Arc::new(move |signal: TransportSignal| {
            if let Some(request) = weak.upgrade() {
                request.handle_signal(signal);
            }
        }));

        if let Err(e) = self.transport.open(self.config.method(), self.core.url()) {
            warn!(%connection_id, error = %e, "Transport refused open");
            self.core.dispatch(EventKind::Open);
            self.fail_locally();
            return self;
        }
        self.transport.set_timeout(self.config.timeout());

        debug!(%connection_id, method = %self.config.method(), url = %self.core.url(), "Request opened");
        self.core.dispatch(EventKind::Open);

        for (name, value) in self.config.headers() {
            if let Some(value) = value {
                self.transport.set_request_header(name, value);
            }
        }
        for (name, value) in extra_headers {
            if let Some(value) = value {
                self.transport
                    .set_request_header(name.as_ref(), value.as_ref());
            }
        }

        self.transport.set_response_type(self.config.response_type());

        // A close from an `open` listener may already have run against an
        // idle transport.
        if self.abort_requested.load(Ordering::Acquire) {
            debug!(%connection_id, "Request closed before send");
            if self.core.transition(ConnectionState::Closed) {
                self.core.dispatch(EventKind::Abort);
            }
            return self;
        }

        if let Err(e) = self.transport.send(self.config.body()) {
            warn!(%connection_id, error = %e, "Transport refused send");
            self.fail_locally();
            return self;
        }

        if self.abort_requested.load(Ordering::Acquire)
            && self.core.state() == ConnectionState::Open
        {
            debug!(%connection_id, "Aborting request closed during send");
            self.transport.abort();
        }

        self
    }

    /// Aborts the request.
    ///
    /// A request that never opened closes at once with an `abort` event. An
    /// open request asks the transport to abort; the transport's abort
    /// signal performs the transition. An open request whose body has not
    /// been sent yet is never sent and closes with an `abort` event instead.
    /// A closed request is left alone.
    pub fn abort(&self) -> &Self {
        let connection_id = self.core.id();

        match self.core.state() {
            ConnectionState::Init => {
                if self
                    .core
                    .transition_from(ConnectionState::Init, ConnectionState::Closed)
                {
                    debug!(%connection_id, "Request aborted before open");
                    self.core.dispatch(EventKind::Abort);
                } else {
                    // Opened concurrently.
                    self.abort();
                }
            }
            ConnectionState::Open => {
                debug!(%connection_id, "Aborting transport");
                self.abort_requested.store(true, Ordering::Release);
                self.transport.abort();
            }
            ConnectionState::Closed => {
                trace!(%connection_id, "Close ignored");
            }
        }

        self
    }

    /// Maps one transport signal to a state change and an event.
    fn handle_signal(&self, signal: TransportSignal) {
        let connection_id = self.core.id();

        let kind = match signal {
            TransportSignal::Progress => {
                if self.core.state() != ConnectionState::Open {
                    warn!(%connection_id, state = %self.core.state(), "Progress outside open state ignored");
                    return;
                }
                EventKind::Data
            }
            TransportSignal::Load => {
                let status = self.transport.status();
                debug!(%connection_id, status, "Response loaded");
                if status < ERROR_STATUS_THRESHOLD {
                    EventKind::Complete
                } else {
                    EventKind::Error
                }
            }
            TransportSignal::Error | TransportSignal::Timeout => {
                debug!(%connection_id, ?signal, "Request failed");
                EventKind::Error
            }
            TransportSignal::Abort => EventKind::Abort,
        };

        // The losing signal of a race still raises its event.
        if kind.is_terminal() && !self.core.transition(ConnectionState::Closed) {
            debug!(%connection_id, ?signal, "Signal after close");
        }

        self.core.dispatch(kind);
    }

    fn fail_locally(&self) {
        self.core.transition(ConnectionState::Closed);
        self.core.dispatch(EventKind::Error);
    }
}

// ============================================================================
// HttpRequest - Accessors
// ============================================================================

impl<T: Transport> HttpRequest<T> {
    /// Returns the validated configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Returns the underlying transport.
    #[inline]
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Decodes the transport response.
    ///
    /// With response type `json`, a transport that fell back to raw text
    /// still yields a parsed value: empty text becomes `null`.
    fn decode_response(&self) -> Result<ResponseBody> {
        let body = self.transport.response();

        let json_requested = self.config.response_type() == ResponseType::Json;
        let json_negotiated = self.transport.response_type() == Some(ResponseType::Json);
        if !json_requested || json_negotiated {
            return Ok(body);
        }

        match body {
            ResponseBody::Text(text) if text.trim().is_empty() => {
                Ok(ResponseBody::Json(Value::Null))
            }
            ResponseBody::Text(text) => Ok(ResponseBody::Json(serde_json::from_str(&text)?)),
            other => Ok(other),
        }
    }
}

// ============================================================================
// Connection Implementation
// ============================================================================

impl<T: Transport> Connection for HttpRequest<T> {
    fn core(&self) -> &ConnectionCore {
        &self.core
    }

    fn open(&self) -> Result<()> {
        self.open_with(NO_HEADERS);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.abort();
        Ok(())
    }

    fn status(&self) -> u16 {
        self.transport.status()
    }

    fn response(&self) -> Result<ResponseBody> {
        self.decode_response()
    }
}

impl<T: Transport> fmt::Debug for HttpRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("id", &self.core.id())
            .field("url", &self.core.url().as_str())
            .field("state", &self.core.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
