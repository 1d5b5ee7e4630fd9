//! Request and response value types.
//!
//! The allowed vocabularies of the HTTP binding: request methods, response
//! types, request bodies and decoded response bodies.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Method
// ============================================================================

/// Allowed request methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Method {
    /// All allowed methods.
    pub const ALL: [Method; 4] = [Method::Get, Method::Post, Method::Put, Method::Delete];

    /// Returns the method token.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == token)
            .ok_or_else(|| {
                Error::invalid_configuration(format!(
                    "method {token:?} is not allowed, expected one of GET, POST, PUT, DELETE"
                ))
            })
    }
}

// ============================================================================
// ResponseType
// ============================================================================

/// Response types a transport can be asked to decode into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Raw bytes.
    ArrayBuffer,
    /// Raw bytes, opaque to the caller.
    Blob,
    /// Markup document.
    Document,
    /// Parsed JSON value.
    #[default]
    Json,
    /// UTF-8 text.
    Text,
}

impl ResponseType {
    /// All allowed response types.
    pub const ALL: [ResponseType; 5] = [
        ResponseType::ArrayBuffer,
        ResponseType::Blob,
        ResponseType::Document,
        ResponseType::Json,
        ResponseType::Text,
    ];

    /// Returns the response type name.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ArrayBuffer => "arraybuffer",
            Self::Blob => "blob",
            Self::Document => "document",
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|response_type| response_type.as_str() == name)
            .ok_or_else(|| {
                Error::invalid_configuration(format!(
                    "response type {name:?} is not allowed, \
                     expected one of arraybuffer, blob, document, json, text"
                ))
            })
    }
}

// ============================================================================
// RequestBody
// ============================================================================

/// Payload sent with a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    /// Text payload.
    Text(String),
    /// JSON payload.
    Json(Value),
    /// Binary payload.
    Bytes(Vec<u8>),
}

impl RequestBody {
    /// Returns the body as bytes, serializing JSON payloads.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.as_bytes().to_vec(),
            Self::Json(value) => value.to_string().into_bytes(),
            Self::Bytes(bytes) => bytes.clone(),
        }
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

// ============================================================================
// ResponseBody
// ============================================================================

/// Response as decoded by a transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResponseBody {
    /// Nothing received yet.
    #[default]
    Empty,
    /// Decoded text.
    Text(String),
    /// Parsed JSON value.
    Json(Value),
    /// Raw bytes (`arraybuffer` and `blob`).
    Bytes(Vec<u8>),
    /// Raw markup (`document`).
    Document(String),
}

impl ResponseBody {
    /// Returns the JSON value, if this is a JSON body.
    #[inline]
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the text, if this is a text or document body.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Document(text) => Some(text),
            _ => None,
        }
    }

    /// Returns `true` if nothing was received.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_method_parse() {
        assert_eq!("GET".parse::<Method>().expect("GET"), Method::Get);
        assert_eq!("DELETE".parse::<Method>().expect("DELETE"), Method::Delete);
    }

    #[test]
    fn test_method_rejects_patch() {
        let err = "PATCH".parse::<Method>().unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("PATCH"));
    }

    #[test]
    fn test_method_is_case_sensitive() {
        assert!("get".parse::<Method>().is_err());
    }

    #[test]
    fn test_response_type_parse() {
        assert_eq!(
            "arraybuffer".parse::<ResponseType>().expect("arraybuffer"),
            ResponseType::ArrayBuffer
        );
        assert!("stream".parse::<ResponseType>().is_err());
        assert!("".parse::<ResponseType>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Method::default(), Method::Get);
        assert_eq!(ResponseType::default(), ResponseType::Json);
        assert!(ResponseBody::default().is_empty());
    }

    #[test]
    fn test_request_body_bytes() {
        assert_eq!(RequestBody::from("hi").to_bytes(), b"hi");
        assert_eq!(RequestBody::from(json!({"a": 1})).to_bytes(), br#"{"a":1}"#);
        assert_eq!(RequestBody::from(vec![1u8, 2]).to_bytes(), vec![1, 2]);
    }

    #[test]
    fn test_request_body_deserialize() {
        let body: RequestBody = serde_json::from_str("\"text\"").expect("parse");
        assert_eq!(body, RequestBody::Text("text".into()));
        let body: RequestBody = serde_json::from_str(r#"{"k":true}"#).expect("parse");
        assert_eq!(body, RequestBody::Json(json!({"k": true})));
    }

    #[test]
    fn test_response_body_accessors() {
        let body = ResponseBody::Json(json!({"a": 1}));
        assert_eq!(body.as_json(), Some(&json!({"a": 1})));
        assert_eq!(body.as_text(), None);
        assert_eq!(ResponseBody::Document("<p/>".into()).as_text(), Some("<p/>"));
    }
}
