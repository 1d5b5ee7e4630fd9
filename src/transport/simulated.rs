//! In-memory transport.
//!
//! [`SimulatedTransport`] records everything a driver asks of it and lets the
//! caller raise signals by hand, which makes every lifecycle path reachable
//! without a network.
//!
//! # Example
//!
//! ```
//! use request_connection::{SimulatedTransport, Transport, TransportSignal};
//!
//! let transport = SimulatedTransport::new();
//! let handle = transport.clone();
//! transport.set_signal_handler(std::sync::Arc::new(|signal: TransportSignal| {
//!     assert_eq!(signal, TransportSignal::Load);
//! }));
//!
//! handle.complete(204, "");
//! assert_eq!(transport.status(), 204);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{Method, RequestBody, ResponseBody, ResponseType};

use super::{SignalHandler, Transport, TransportSignal};

// ============================================================================
// SimulatedState
// ============================================================================

#[derive(Default)]
struct SimulatedState {
    handler: Option<SignalHandler>,
    request: Option<(Method, Url)>,
    timeout: Duration,
    headers: Vec<(String, String)>,
    requested_type: Option<ResponseType>,
    negotiated_type: Option<ResponseType>,
    sent_body: Option<RequestBody>,
    send_count: usize,
    abort_count: usize,
    in_flight: bool,
    status: u16,
    response: ResponseBody,
    json_falls_back_to_text: bool,
    refuse_send: bool,
}

// ============================================================================
// SimulatedTransport
// ============================================================================

/// Transport whose network side is driven by the caller.
///
/// Clones share state: keep one clone to inspect and drive the transport
/// after handing the other to a driver.
#[derive(Clone, Default)]
pub struct SimulatedTransport {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedTransport {
    /// Creates a transport that negotiates every response type.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `json` negotiation fall back to raw text.
    #[must_use]
    pub fn with_json_fallback(self) -> Self {
        self.state.lock().json_falls_back_to_text = true;
        self
    }

    /// Makes [`Transport::send`] fail.
    #[must_use]
    pub fn refusing_send(self) -> Self {
        self.state.lock().refuse_send = true;
        self
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Returns the method and URL passed to [`Transport::open`].
    #[must_use]
    pub fn request(&self) -> Option<(Method, Url)> {
        self.state.lock().request.clone()
    }

    /// Returns the headers set so far, in order.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        self.state.lock().headers.clone()
    }

    /// Returns the configured timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.state.lock().timeout
    }

    /// Returns the response type the driver asked for.
    #[must_use]
    pub fn requested_response_type(&self) -> Option<ResponseType> {
        self.state.lock().requested_type
    }

    /// Returns the body passed to the last [`Transport::send`].
    #[must_use]
    pub fn sent_body(&self) -> Option<RequestBody> {
        self.state.lock().sent_body.clone()
    }

    /// Returns how many times the request was sent.
    #[must_use]
    pub fn send_count(&self) -> usize {
        self.state.lock().send_count
    }

    /// Returns how many times [`Transport::abort`] was called.
    #[must_use]
    pub fn abort_count(&self) -> usize {
        self.state.lock().abort_count
    }

    /// Returns `true` between a successful send and the final signal.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.state.lock().in_flight
    }

    // ========================================================================
    // Driving
    // ========================================================================

    /// Raises [`TransportSignal::Progress`].
    pub fn progress(&self) {
        self.fire(TransportSignal::Progress);
    }

    /// Stores a response decoded per the negotiated type, then raises
    /// [`TransportSignal::Load`].
    ///
    /// A body that is not valid JSON decodes to `null` under `json`.
    pub fn complete(&self, status: u16, body: &str) {
        {
            let mut state = self.state.lock();
            state.status = status;
            state.in_flight = false;
            let negotiated = state.negotiated_type;
            state.response = match negotiated {
                Some(ResponseType::Json) => {
                    ResponseBody::Json(serde_json::from_str(body).unwrap_or(Value::Null))
                }
                Some(ResponseType::ArrayBuffer | ResponseType::Blob) => {
                    ResponseBody::Bytes(body.as_bytes().to_vec())
                }
                Some(ResponseType::Document) => ResponseBody::Document(body.to_string()),
                Some(ResponseType::Text) | None => ResponseBody::Text(body.to_string()),
            };
        }
        self.fire(TransportSignal::Load);
    }

    /// Raises [`TransportSignal::Error`].
    pub fn fail(&self) {
        self.state.lock().in_flight = false;
        self.fire(TransportSignal::Error);
    }

    /// Raises [`TransportSignal::Timeout`].
    pub fn time_out(&self) {
        self.state.lock().in_flight = false;
        self.fire(TransportSignal::Timeout);
    }

    fn fire(&self, signal: TransportSignal) {
        // Cloned out: the handler reads status and response back.
        let handler = self.state.lock().handler.clone();
        trace!(?signal, installed = handler.is_some(), "Simulated signal");
        if let Some(handler) = handler {
            handler(signal);
        }
    }
}

// ============================================================================
// Transport Implementation
// ============================================================================

impl Transport for SimulatedTransport {
    fn set_signal_handler(&self, handler: SignalHandler) {
        self.state.lock().handler = Some(handler);
    }

    fn open(&self, method: Method, url: &Url) -> Result<()> {
        let mut state = self.state.lock();
        state.request = Some((method, url.clone()));
        state.status = 0;
        state.response = ResponseBody::Empty;
        Ok(())
    }

    fn set_timeout(&self, timeout: Duration) {
        self.state.lock().timeout = timeout;
    }

    fn set_request_header(&self, name: &str, value: &str) {
        self.state
            .lock()
            .headers
            .push((name.to_string(), value.to_string()));
    }

    fn set_response_type(&self, response_type: ResponseType) {
        let mut state = self.state.lock();
        state.requested_type = Some(response_type);
        state.negotiated_type =
            if state.json_falls_back_to_text && response_type == ResponseType::Json {
                None
            } else {
                Some(response_type)
            };
    }

    fn response_type(&self) -> Option<ResponseType> {
        self.state.lock().negotiated_type
    }

    fn send(&self, body: Option<&RequestBody>) -> Result<()> {
        let mut state = self.state.lock();
        if state.refuse_send {
            return Err(Error::transport("simulated send refused"));
        }
        state.sent_body = body.cloned();
        state.send_count += 1;
        state.in_flight = true;
        Ok(())
    }

    fn abort(&self) {
        let was_in_flight = {
            let mut state = self.state.lock();
            state.abort_count += 1;
            std::mem::replace(&mut state.in_flight, false)
        };

        if was_in_flight {
            self.fire(TransportSignal::Abort);
        }
    }

    fn status(&self) -> u16 {
        self.state.lock().status
    }

    fn response(&self) -> ResponseBody {
        self.state.lock().response.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
