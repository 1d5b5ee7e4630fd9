//! Request options and validation.
//!
//! [`RequestOptions`] is the loosely typed option bag callers fill in (by
//! hand, with `with_*` methods, or from JSON). [`RequestOptions::validate`]
//! checks every option against its allowed domain and produces an immutable
//! [`RequestConfig`]. Nothing touches a transport until validation passed.
//!
//! # Example
//!
//! ```
//! use request_connection::{Method, RequestOptions, ResponseType};
//!
//! let config = RequestOptions::new()
//!     .with_method("POST")
//!     .with_body("name=value")
//!     .with_header("Content-Type", "application/x-www-form-urlencoded")
//!     .with_response_type("text")
//!     .with_timeout(5_000)
//!     .validate()?;
//!
//! assert_eq!(config.method(), Method::Post);
//! assert_eq!(config.response_type(), ResponseType::Text);
//! # Ok::<(), request_connection::Error>(())
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::connection::Listener;
use crate::error::{Error, Result};
use crate::protocol::{EventKind, Method, RequestBody, ResponseType};

// ============================================================================
// Constants
// ============================================================================

/// Header set when no headers are configured.
pub const DEFAULT_ACCEPT: (&str, &str) = ("Accept", "application/json");

/// Largest timeout accepted, in milliseconds (2^53 - 1).
pub const MAX_TIMEOUT_MS: i64 = 9_007_199_254_740_991;

// ============================================================================
// Types
// ============================================================================

/// Ordered header list. `None` values are skipped when applied.
pub type HeaderList = Vec<(String, Option<String>)>;

// ============================================================================
// ListenerSpec
// ============================================================================

/// A listener to register at construction time, before any event fires.
#[derive(Clone)]
pub struct ListenerSpec {
    /// Event kind name, e.g. `"complete"`.
    pub event_type: String,
    /// Callback invoked with each matching event.
    pub callback: Listener,
}

impl ListenerSpec {
    /// Creates a listener spec from a kind name.
    #[inline]
    #[must_use]
    pub fn new(event_type: impl Into<String>, callback: Listener) -> Self {
        Self {
            event_type: event_type.into(),
            callback,
        }
    }

    /// Creates a listener spec from a kind.
    #[inline]
    #[must_use]
    pub fn for_kind(kind: EventKind, callback: Listener) -> Self {
        Self::new(kind.as_str(), callback)
    }
}

impl fmt::Debug for ListenerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSpec")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RequestOptions
// ============================================================================

/// Unvalidated request options.
///
/// Deserializes from camelCase JSON; listeners cannot be deserialized and are
/// added with [`with_listener`](Self::with_listener).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestOptions {
    /// Request method; `GET` when unset.
    pub method: Option<String>,

    /// Request payload.
    pub body: Option<RequestBody>,

    /// Header object; `{"Accept": "application/json"}` when unset.
    pub headers: Option<Value>,

    /// Response decoding; `json` when unset.
    pub response_type: Option<String>,

    /// Timeout in milliseconds; 0 or unset disables it.
    pub timeout: Option<i64>,

    /// Listeners registered at construction.
    #[serde(skip)]
    pub listeners: Vec<ListenerSpec>,

    /// Open the connection at the end of construction.
    pub open: bool,
}

// ============================================================================
// Constructors
// ============================================================================

impl RequestOptions {
    /// Creates empty options; every field takes its default.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the JSON does not describe
    /// an option object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::invalid_configuration(format!("malformed options: {e}")))
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl RequestOptions {
    /// Sets the request method.
    #[inline]
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Sets the request body.
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Replaces the header object.
    #[inline]
    #[must_use]
    pub fn with_headers(mut self, headers: Value) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Adds one header.
    ///
    /// Starts from the default `Accept` header when no headers were set.
    /// Has no effect on a header value that is not an object; validation
    /// rejects that value anyway.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let headers = self.headers.get_or_insert_with(default_headers);
        if let Value::Object(map) = headers {
            map.insert(name.into(), value.into());
        }
        self
    }

    /// Sets the response type.
    #[inline]
    #[must_use]
    pub fn with_response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    /// Sets the timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: i64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    /// Adds a listener for the kind called `event_type`.
    #[inline]
    #[must_use]
    pub fn with_listener(mut self, event_type: impl Into<String>, callback: Listener) -> Self {
        self.listeners.push(ListenerSpec::new(event_type, callback));
        self
    }

    /// Opens the connection at the end of construction.
    #[inline]
    #[must_use]
    pub fn with_open(mut self) -> Self {
        self.open = true;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl RequestOptions {
    /// Checks every option and produces the immutable configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first rejected
    /// option.
    pub fn validate(self) -> Result<RequestConfig> {
        let method = match self.method.as_deref() {
            Some(token) => token.parse()?,
            None => Method::default(),
        };

        let response_type = match self.response_type.as_deref() {
            Some(name) => name.parse()?,
            None => ResponseType::default(),
        };

        let headers = match self.headers {
            Some(value) => validate_headers(value)?,
            None => vec![(DEFAULT_ACCEPT.0.to_string(), Some(DEFAULT_ACCEPT.1.to_string()))],
        };

        let timeout = validate_timeout(self.timeout.unwrap_or(0))?;
        let listeners = validate_listeners(self.listeners)?;

        Ok(RequestConfig {
            method,
            body: self.body,
            headers,
            response_type,
            timeout,
            listeners,
            open: self.open,
        })
    }
}

fn default_headers() -> Value {
    let mut map = Map::new();
    map.insert(DEFAULT_ACCEPT.0.to_string(), Value::from(DEFAULT_ACCEPT.1));
    Value::Object(map)
}

fn validate_headers(value: Value) -> Result<HeaderList> {
    let Value::Object(map) = value else {
        return Err(Error::invalid_configuration(format!(
            "headers must be an object, got {}",
            json_type_name(&value)
        )));
    };

    map.into_iter()
        .map(|(name, value)| {
            let value = match value {
                Value::Null => None,
                Value::String(text) => Some(text),
                Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
                Value::Array(_) | Value::Object(_) => {
                    return Err(Error::invalid_configuration(format!(
                        "header {name:?} must be a string, number, boolean or null, got {}",
                        json_type_name(&value)
                    )));
                }
            };
            Ok((name, value))
        })
        .collect()
}

fn validate_timeout(timeout_ms: i64) -> Result<Duration> {
    if !(0..=MAX_TIMEOUT_MS).contains(&timeout_ms) {
        return Err(Error::invalid_configuration(format!(
            "timeout must be a non-negative safe integer, got {timeout_ms}"
        )));
    }
    Ok(Duration::from_millis(timeout_ms.unsigned_abs()))
}

fn validate_listeners(specs: Vec<ListenerSpec>) -> Result<Vec<(EventKind, Listener)>> {
    specs
        .into_iter()
        .enumerate()
        .map(|(index, spec)| {
            let kind = spec.event_type.parse().map_err(|_| {
                Error::invalid_configuration(format!(
                    "listener {index} has unknown event type {:?}",
                    spec.event_type
                ))
            })?;
            Ok((kind, spec.callback))
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parses the target address.
///
/// # Errors
///
/// Returns [`Error::InvalidConfiguration`] if `url` is not an absolute URL.
pub(crate) fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::invalid_configuration(format!("url {url:?}: {e}")))
}

// ============================================================================
// RequestConfig
// ============================================================================

/// Validated, immutable request configuration.
#[derive(Clone)]
pub struct RequestConfig {
    method: Method,
    body: Option<RequestBody>,
    headers: HeaderList,
    response_type: ResponseType,
    timeout: Duration,
    listeners: Vec<(EventKind, Listener)>,
    open: bool,
}

impl RequestConfig {
    /// Returns the request method.
    #[inline]
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Returns the request body.
    #[inline]
    #[must_use]
    pub const fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Returns the configured headers, in order.
    #[inline]
    #[must_use]
    pub fn headers(&self) -> &[(String, Option<String>)] {
        &self.headers
    }

    /// Returns the response type.
    #[inline]
    #[must_use]
    pub const fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// Returns the timeout; [`Duration::ZERO`] means none.
    #[inline]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns `true` if the connection opens at construction.
    #[inline]
    #[must_use]
    pub const fn opens_immediately(&self) -> bool {
        self.open
    }

    /// Returns the number of construction-time listeners not yet registered.
    #[inline]
    #[must_use]
    pub fn pending_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Hands the construction-time listeners over for registration.
    pub(crate) fn take_listeners(&mut self) -> Vec<(EventKind, Listener)> {
        std::mem::take(&mut self.listeners)
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("method", &self.method)
            .field("body", &self.body)
            .field("headers", &self.headers)
            .field("response_type", &self.response_type)
            .field("timeout", &self.timeout)
            .field("listeners", &self.listeners.len())
            .field("open", &self.open)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::connection::listener;

    fn expect_config_error(options: RequestOptions, needle: &str) {
        let err = options.validate().unwrap_err();
        assert!(err.is_configuration_error(), "unexpected error: {err}");
        assert!(
            err.to_string().contains(needle),
            "{err} does not mention {needle:?}"
        );
    }

    #[test]
    fn test_defaults() {
        let config = RequestOptions::new().validate().expect("defaults are valid");
        assert_eq!(config.method(), Method::Get);
        assert_eq!(config.response_type(), ResponseType::Json);
        assert_eq!(config.timeout(), Duration::ZERO);
        assert!(config.body().is_none());
        assert!(!config.opens_immediately());
        assert_eq!(
            config.headers(),
            [("Accept".to_string(), Some("application/json".to_string()))]
        );
    }

    #[test]
    fn test_builder_chain() {
        let config = RequestOptions::new()
            .with_method("PUT")
            .with_body(json!({"id": 3}))
            .with_response_type("blob")
            .with_timeout(1_500)
            .with_listener("complete", listener(|_| {}))
            .with_open()
            .validate()
            .expect("valid");

        assert_eq!(config.method(), Method::Put);
        assert_eq!(config.body(), Some(&RequestBody::Json(json!({"id": 3}))));
        assert_eq!(config.response_type(), ResponseType::Blob);
        assert_eq!(config.timeout(), Duration::from_millis(1_500));
        assert_eq!(config.pending_listeners(), 1);
        assert!(config.opens_immediately());
    }

    #[test]
    fn test_rejects_patch() {
        expect_config_error(RequestOptions::new().with_method("PATCH"), "PATCH");
    }

    #[test]
    fn test_rejects_unknown_response_type() {
        expect_config_error(
            RequestOptions::new().with_response_type("stream"),
            "stream",
        );
    }

    #[test]
    fn test_rejects_non_object_headers() {
        expect_config_error(
            RequestOptions::new().with_headers(json!(["Accept"])),
            "headers must be an object",
        );
    }

    #[test]
    fn test_rejects_nested_header_value() {
        expect_config_error(
            RequestOptions::new().with_headers(json!({"X-Meta": {"a": 1}})),
            "X-Meta",
        );
    }

    #[test]
    fn test_header_values() {
        let config = RequestOptions::new()
            .with_headers(json!({"X-Null": null, "X-Num": 7, "X-Text": "t"}))
            .validate()
            .expect("valid");

        let headers = config.headers();
        assert!(headers.contains(&("X-Null".to_string(), None)));
        assert!(headers.contains(&("X-Num".to_string(), Some("7".to_string()))));
        assert!(headers.contains(&("X-Text".to_string(), Some("t".to_string()))));
    }

    #[test]
    fn test_headers_keep_written_order() {
        let config = RequestOptions::from_json(
            r#"{"headers": {"X-Zeta": "1", "Accept": "text/plain", "X-Alpha": "2"}}"#,
        )
        .expect("well-formed")
        .validate()
        .expect("valid");

        let names: Vec<&str> = config.headers().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["X-Zeta", "Accept", "X-Alpha"]);
    }

    #[test]
    fn test_with_header_keeps_default_accept() {
        let config = RequestOptions::new()
            .with_header("X-Trace", "abc")
            .validate()
            .expect("valid");
        assert_eq!(config.headers().len(), 2);
    }

    #[test]
    fn test_rejects_negative_timeout() {
        expect_config_error(RequestOptions::new().with_timeout(-1), "timeout");
    }

    #[test]
    fn test_rejects_unsafe_timeout() {
        expect_config_error(
            RequestOptions::new().with_timeout(MAX_TIMEOUT_MS + 1),
            "timeout",
        );
        assert!(RequestOptions::new()
            .with_timeout(MAX_TIMEOUT_MS)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_rejects_unknown_listener_type() {
        expect_config_error(
            RequestOptions::new()
                .with_listener("open", listener(|_| {}))
                .with_listener("progress", listener(|_| {})),
            "listener 1",
        );
    }

    #[test]
    fn test_from_json() {
        let options = RequestOptions::from_json(
            r#"{
                "method": "DELETE",
                "headers": {"Accept": "text/plain"},
                "responseType": "text",
                "timeout": 250,
                "open": true
            }"#,
        )
        .expect("parse");

        let config = options.validate().expect("valid");
        assert_eq!(config.method(), Method::Delete);
        assert_eq!(config.response_type(), ResponseType::Text);
        assert_eq!(config.timeout(), Duration::from_millis(250));
        assert!(config.opens_immediately());
    }

    #[test]
    fn test_from_json_rejects_fractional_timeout() {
        let err = RequestOptions::from_json(r#"{"timeout": 1.5}"#).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_parse_url() {
        assert!(parse_url("https://example.com/a?b=c").is_ok());
        let err = parse_url("/relative").unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_take_listeners() {
        let mut config = RequestOptions::new()
            .with_listener("data", listener(|_| {}))
            .validate()
            .expect("valid");

        let taken = config.take_listeners();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].0, EventKind::Data);
        assert_eq!(config.pending_listeners(), 0);
    }
}
