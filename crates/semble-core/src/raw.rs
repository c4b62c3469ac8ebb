//! Raw, untyped error shapes as they arrive from upstream collaborators.
//!
//! Upstream clients hand the integration layer whatever they failed with:
//! an already typed [`SembleError`], a JSON error object (GraphQL error,
//! HTTP client error, ...) or a bare message. [`RawError`] captures the three
//! cases; the accessor helpers below read the fields the classifiers look at.

use crate::error::SembleError;
use serde_json::{json, Value};

/// Connection-level codes reported by HTTP clients.
pub const NETWORK_ERROR_CODES: [&str; 5] =
    ["ECONNREFUSED", "ENOTFOUND", "ETIMEDOUT", "ECONNRESET", "EAI_AGAIN"];

/// Marker key identifying a missing-permission placeholder or error.
pub const MISSING_PERMISSION_MARKER: &str = "__MISSING_PERMISSION__";

/// Marker key holding the redacted field's name.
pub const FIELD_NAME_MARKER: &str = "__FIELD_NAME__";

/// Marker key holding the human-readable redaction message.
pub const ERROR_MESSAGE_MARKER: &str = "__ERROR_MESSAGE__";

/// An error as received from an upstream collaborator.
#[derive(Debug, Clone)]
pub enum RawError {
    /// Already a typed error; classification passes it through.
    Typed(SembleError),
    /// A JSON error object.
    Shape(Value),
    /// A bare message.
    Message(String),
}

impl RawError {
    /// Returns the JSON shape of the error, if it is not already typed.
    #[must_use]
    pub fn into_shape(self) -> Result<Value, SembleError> {
        match self {
            Self::Typed(error) => Err(error),
            Self::Shape(value) => Ok(value),
            Self::Message(message) => Ok(json!({ "message": message })),
        }
    }
}

impl From<SembleError> for RawError {
    fn from(error: SembleError) -> Self {
        Self::Typed(error)
    }
}

impl From<Value> for RawError {
    fn from(value: Value) -> Self {
        Self::Shape(value)
    }
}

impl From<String> for RawError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for RawError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

/// Reads a non-empty string field.
pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Reads the error message, if any.
pub(crate) fn message_of(value: &Value) -> Option<&str> {
    str_field(value, "message")
}

/// Reads the HTTP status from `response.status`, `status` or `statusCode`.
pub(crate) fn status_of(value: &Value) -> Option<u16> {
    value
        .pointer("/response/status")
        .and_then(Value::as_u64)
        .or_else(|| value.get("status").and_then(Value::as_u64))
        .or_else(|| value.get("statusCode").and_then(Value::as_u64))
        .and_then(|status| u16::try_from(status).ok())
}

/// Reads a list of strings, skipping non-string entries.
pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}
