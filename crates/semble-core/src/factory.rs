//! Classification of arbitrary error-like values into [`SembleError`] subtypes.
//!
//! The [`ErrorFactory`] holds an ordered list of [`Classifier`]s. The first
//! classifier whose predicate accepts the value converts it; values nobody
//! accepts become a generic `UNKNOWN_ERROR`.
//!
//! Order:
//!
//! 1. already typed (passthrough)
//! 2. HTTP status present → API error
//! 3. connection code → network error
//! 4. validation markers → validation error
//! 5. permission markers → permission error
//! 6. authentication markers → authentication error

use crate::error::{
    AuthDetails, NetworkDetails, PermissionDetails, SembleError, UpstreamError,
    ValidationDetails, UNKNOWN_ERROR, UNKNOWN_ERROR_MESSAGE,
};
use crate::raw::{
    message_of, status_of, str_field, string_list, RawError, MISSING_PERMISSION_MARKER,
    NETWORK_ERROR_CODES,
};
use serde_json::Value;
use std::time::Duration;

/// A predicate + converter pair.
#[derive(Clone, Copy)]
pub struct Classifier {
    /// Name used in logs and tests.
    pub name: &'static str,
    /// Returns `true` if this classifier handles the value.
    pub matches: fn(&Value) -> bool,
    /// Converts the value.
    pub convert: fn(&Value) -> SembleError,
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier").field("name", &self.name).finish()
    }
}

/// Turns raw upstream errors into typed errors.
#[derive(Debug, Clone)]
pub struct ErrorFactory {
    classifiers: Vec<Classifier>,
}

impl Default for ErrorFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorFactory {
    /// Creates a factory with the built-in classifiers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            classifiers: vec![
                Classifier {
                    name: "api",
                    matches: is_http_shaped,
                    convert: to_api_error,
                },
                Classifier {
                    name: "network",
                    matches: is_network_shaped,
                    convert: to_network_error,
                },
                Classifier {
                    name: "validation",
                    matches: is_validation_shaped,
                    convert: to_validation_error,
                },
                Classifier {
                    name: "permission",
                    matches: is_permission_shaped,
                    convert: to_permission_error,
                },
                Classifier {
                    name: "authentication",
                    matches: is_auth_shaped,
                    convert: to_auth_error,
                },
            ],
        }
    }

    /// Returns the classifiers in evaluation order.
    #[must_use]
    pub fn classifiers(&self) -> &[Classifier] {
        &self.classifiers
    }

    /// Classifies a raw error.
    #[must_use]
    pub fn classify(&self, raw: impl Into<RawError>) -> SembleError {
        let value = match raw.into().into_shape() {
            Ok(value) => value,
            Err(typed) => return typed,
        };

        self.classifiers
            .iter()
            .find(|classifier| (classifier.matches)(&value))
            .map_or_else(|| to_unknown_error(&value), |c| (c.convert)(&value))
    }
}

pub(crate) fn is_http_shaped(value: &Value) -> bool {
    status_of(value).is_some()
}

pub(crate) fn is_network_shaped(value: &Value) -> bool {
    str_field(value, "code").is_some_and(|code| NETWORK_ERROR_CODES.contains(&code))
}

pub(crate) fn is_validation_shaped(value: &Value) -> bool {
    str_field(value, "name") == Some("ValidationError")
        || str_field(value, "code") == Some("VALIDATION_ERROR")
        || (value.get("field").is_some() && value.get("constraints").is_some())
}

pub(crate) fn is_permission_shaped(value: &Value) -> bool {
    str_field(value, "code") == Some("PERMISSION_DENIED")
        || str_field(value, "name") == Some("PermissionError")
        || value.get("requiredPermission").is_some()
        || value.get(MISSING_PERMISSION_MARKER).is_some()
}

pub(crate) fn is_auth_shaped(value: &Value) -> bool {
    matches!(
        str_field(value, "code"),
        Some("AUTHENTICATION_ERROR" | "UNAUTHENTICATED" | "INVALID_TOKEN")
    ) || str_field(value, "name") == Some("AuthenticationError")
}

fn to_api_error(value: &Value) -> SembleError {
    let status = status_of(value);
    let response = value
        .pointer("/response/data")
        .cloned()
        .or_else(|| value.get("response").cloned());
    let message = message_of(value)
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("API request failed with status {}", status.unwrap_or(0)));
    SembleError::api(message, status, response)
}

fn to_network_error(value: &Value) -> SembleError {
    let code = str_field(value, "code").unwrap_or("NETWORK_ERROR");
    let message = message_of(value).unwrap_or("Network request failed");
    let details = NetworkDetails {
        url: str_field(value, "url")
            .or_else(|| value.pointer("/config/url").and_then(Value::as_str))
            .map(ToString::to_string),
        timeout: value
            .get("timeout")
            .and_then(Value::as_u64)
            .map(Duration::from_millis),
    };
    SembleError::network(message, details).with_cause(UpstreamError(format!("{code}: {message}")))
}

pub(crate) fn to_validation_error(value: &Value) -> SembleError {
    let details = ValidationDetails {
        field: str_field(value, "field").map(ToString::to_string),
        value: value.get("value").cloned(),
        constraints: string_list(value.get("constraints")),
    };
    SembleError::validation(message_of(value).unwrap_or("Validation failed"), details)
}

pub(crate) fn to_permission_error(value: &Value) -> SembleError {
    let details = PermissionDetails {
        required_permission: str_field(value, "requiredPermission")
            .unwrap_or("unknown")
            .to_string(),
        field: str_field(value, "field").map(ToString::to_string),
        operation: str_field(value, "operation").map(ToString::to_string),
    };
    SembleError::permission(message_of(value).unwrap_or("Permission denied"), details)
}

fn to_auth_error(value: &Value) -> SembleError {
    let details = AuthDetails {
        credential_type: str_field(value, "credentialType").map(ToString::to_string),
        hint: str_field(value, "hint").map(ToString::to_string),
    };
    SembleError::authentication(message_of(value).unwrap_or("Authentication failed"), details)
}

pub(crate) fn to_unknown_error(value: &Value) -> SembleError {
    SembleError::new(message_of(value).unwrap_or(UNKNOWN_ERROR_MESSAGE)).with_code(UNKNOWN_ERROR)
}
