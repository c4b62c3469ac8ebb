//! Translation of upstream GraphQL and HTTP errors into [`SembleError`]s.
//!
//! [`ErrorMapper::map_error`] never suppresses anything: every input becomes
//! exactly one typed error. Detection runs through an ordered list of
//! [`MappingStrategy`] values:
//!
//! 1. GraphQL shape (`extensions`, `message` + `locations`, or `path`)
//! 2. HTTP shape (`response.status`, `status` or `statusCode`)
//! 3. validation shape
//! 4. permission shape
//!
//! Anything else becomes an `UNKNOWN_ERROR` with a sanitized message.
//!
//! [`ErrorMapper::process_field_permissions`] redacts fields of a partial
//! GraphQL response that were denied by field-level permissions.

use crate::error::{
    AuthDetails, ErrorContext, PermissionDetails, SembleError, ValidationDetails,
    RATE_LIMIT_EXCEEDED, UNKNOWN_ERROR, UNKNOWN_ERROR_MESSAGE,
};
use crate::factory::{
    is_permission_shaped, is_validation_shaped, to_permission_error, to_validation_error,
};
use crate::raw::{
    message_of, status_of, str_field, string_list, RawError, ERROR_MESSAGE_MARKER,
    FIELD_NAME_MARKER, MISSING_PERMISSION_MARKER,
};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

/// GraphQL extension code for field-level permission failures.
pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";

/// Hint attached to authentication failures reported by the API.
pub const AUTH_HINT: &str = "Check that your Semble API token is valid and has not expired";

/// Credential kind the integration authenticates with.
pub const CREDENTIAL_TYPE: &str = "sembleApi";

/// A predicate + converter pair used by the mapper.
#[derive(Clone, Copy)]
pub struct MappingStrategy {
    /// Name used in logs and tests.
    pub name: &'static str,
    /// Returns `true` if this strategy handles the value.
    pub matches: fn(&Value) -> bool,
    /// Converts the value using the caller's context.
    pub convert: fn(&Value, &ErrorContext) -> SembleError,
}

impl std::fmt::Debug for MappingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingStrategy")
            .field("name", &self.name)
            .finish()
    }
}

/// Maps heterogeneous upstream errors onto the typed error model.
#[derive(Debug, Clone)]
pub struct ErrorMapper {
    strategies: Vec<MappingStrategy>,
}

impl Default for ErrorMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorMapper {
    /// Creates a mapper with the built-in strategies.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: vec![
                MappingStrategy {
                    name: "graphql",
                    matches: is_graphql_error,
                    convert: Self::map_graphql_error,
                },
                MappingStrategy {
                    name: "http",
                    matches: |value| status_of(value).is_some(),
                    convert: Self::map_http_error,
                },
                MappingStrategy {
                    name: "validation",
                    matches: is_validation_shaped,
                    convert: |value, _| to_validation_error(value),
                },
                MappingStrategy {
                    name: "permission",
                    matches: is_permission_shaped,
                    convert: |value, _| to_permission_error(value),
                },
            ],
        }
    }

    /// Returns the strategies in evaluation order.
    #[must_use]
    pub fn strategies(&self) -> &[MappingStrategy] {
        &self.strategies
    }

    /// Maps one raw error.
    ///
    /// Typed errors are returned unchanged; everything else receives `context`.
    #[must_use]
    pub fn map_error(&self, raw: impl Into<RawError>, context: &ErrorContext) -> SembleError {
        let value = match raw.into().into_shape() {
            Ok(value) => value,
            Err(typed) => return typed,
        };

        let mapped = match self.strategies.iter().find(|s| (s.matches)(&value)) {
            Some(strategy) => {
                tracing::debug!(strategy = strategy.name, "mapping upstream error");
                (strategy.convert)(&value, context)
            }
            None => {
                let message = message_of(&value)
                    .map(sanitize_message)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());
                SembleError::new(message).with_code(UNKNOWN_ERROR)
            }
        };

        mapped.with_context(context.clone())
    }

    /// Maps every entry of a GraphQL `errors` array.
    #[must_use]
    pub fn map_errors(&self, errors: &[Value], context: &ErrorContext) -> Vec<SembleError> {
        errors
            .iter()
            .map(|error| self.map_error(error.clone(), context))
            .collect()
    }

    /// Maps a GraphQL error object.
    #[must_use]
    pub fn map_graphql_error(error: &Value, context: &ErrorContext) -> SembleError {
        let extensions = error.get("extensions").cloned().unwrap_or(Value::Null);
        let code = str_field(&extensions, "code");
        let message = message_of(error).unwrap_or("GraphQL request failed");

        let required_permission = str_field(&extensions, "requiredPermission")
            .or_else(|| str_field(&extensions, "permission"));

        if code == Some(PERMISSION_DENIED) || required_permission.is_some() {
            let permission = required_permission.unwrap_or("unknown");
            let field = str_field(&extensions, "field")
                .map(ToString::to_string)
                .or_else(|| last_path_segment(error));
            let composed = match &field {
                Some(field) => format!("Missing permission '{permission}' to access field '{field}'"),
                None => format!("Missing permission '{permission}'"),
            };
            let mut details = PermissionDetails::new(permission);
            details.field = field;
            details.operation = context.operation.clone();
            return SembleError::permission(composed, details);
        }

        match code {
            Some("BAD_USER_INPUT" | "VALIDATION_ERROR") => {
                let details = ValidationDetails {
                    field: str_field(&extensions, "field").map(ToString::to_string),
                    value: extensions.get("value").cloned(),
                    constraints: string_list(extensions.get("constraints")),
                };
                SembleError::validation(message, details)
            }
            Some("UNAUTHENTICATED" | "FORBIDDEN") => SembleError::authentication(
                message,
                AuthDetails {
                    credential_type: Some(CREDENTIAL_TYPE.to_string()),
                    hint: Some(AUTH_HINT.to_string()),
                },
            ),
            other => SembleError::api(message, None, Some(error.clone()))
                .with_code(other.unwrap_or("GRAPHQL_ERROR")),
        }
    }

    /// Maps an HTTP client error object purely by status code.
    #[must_use]
    pub fn map_http_error(error: &Value, context: &ErrorContext) -> SembleError {
        let status = status_of(error).unwrap_or(0);
        let response = error.pointer("/response/data").cloned();
        let upstream = message_of(error)
            .or_else(|| error.pointer("/response/data/message").and_then(Value::as_str))
            .filter(|m| !m.is_empty());
        let message = upstream.map_or_else(|| default_status_message(status), ToString::to_string);

        match status {
            401 => SembleError::authentication(
                message,
                AuthDetails {
                    credential_type: Some(CREDENTIAL_TYPE.to_string()),
                    hint: Some(AUTH_HINT.to_string()),
                },
            ),
            403 => {
                let mut details = PermissionDetails::new(
                    str_field(error, "requiredPermission").unwrap_or("unknown"),
                );
                details.operation = context.operation.clone();
                SembleError::permission(message, details)
            }
            404 => {
                let resource = context.resource.as_deref().unwrap_or("resource");
                SembleError::api(
                    format!("The requested {resource} could not be found"),
                    Some(status),
                    response,
                )
                .with_code("NOT_FOUND")
            }
            429 => SembleError::api(message, Some(status), response).with_code(RATE_LIMIT_EXCEEDED),
            s if s >= 500 => SembleError::api(message, Some(status), response).with_code("SERVER_ERROR"),
            _ => SembleError::api(message, Some(status), response).with_code("HTTP_ERROR"),
        }
    }

    /// Replaces permission-denied fields of `data` with placeholder objects.
    ///
    /// Only errors whose `extensions.code` is `PERMISSION_DENIED` and that
    /// carry a `path` are applied. Everything else in `data` is left as is.
    #[must_use]
    pub fn process_field_permissions(data: &Value, errors: &[Value]) -> Value {
        let mut processed = data.clone();

        for error in errors {
            if error.pointer("/extensions/code").and_then(Value::as_str) != Some(PERMISSION_DENIED) {
                continue;
            }
            let Some(path) = error.get("path").and_then(Value::as_array) else {
                continue;
            };
            let Some(field) = path.last().map(segment_name) else {
                continue;
            };
            let message = message_of(error).unwrap_or("Permission denied");
            let placeholder = json!({
                MISSING_PERMISSION_MARKER: true,
                FIELD_NAME_MARKER: field,
                ERROR_MESSAGE_MARKER: message,
            });

            match slot_at(&mut processed, path) {
                Some(slot) => *slot = placeholder,
                None => tracing::debug!(?path, "permission path not present in response"),
            }
        }

        processed
    }
}

fn is_graphql_error(value: &Value) -> bool {
    value.get("extensions").is_some()
        || (value.get("message").is_some() && value.get("locations").is_some())
        || value.get("path").is_some()
}

fn last_path_segment(error: &Value) -> Option<String> {
    error
        .get("path")
        .and_then(Value::as_array)
        .and_then(|path| path.last())
        .map(segment_name)
}

fn segment_name(segment: &Value) -> String {
    match segment {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}

fn step<'a>(value: &'a mut Value, segment: &Value) -> Option<&'a mut Value> {
    match (value, segment) {
        (Value::Object(map), Value::String(key)) => map.get_mut(key),
        (Value::Array(items), Value::Number(index)) => {
            items.get_mut(usize::try_from(index.as_u64()?).ok()?)
        }
        _ => None,
    }
}

fn slot_at<'a>(root: &'a mut Value, path: &[Value]) -> Option<&'a mut Value> {
    let (last, parents) = path.split_last()?;
    let mut current = root;
    for segment in parents {
        current = step(current, segment)?;
    }
    match (current, last) {
        (Value::Object(map), Value::String(key)) => {
            Some(map.entry(key.clone()).or_insert(Value::Null))
        }
        (Value::Array(items), Value::Number(index)) => {
            items.get_mut(usize::try_from(index.as_u64()?).ok()?)
        }
        _ => None,
    }
}

/// Default message for an HTTP status when upstream sent none.
#[must_use]
pub fn default_status_message(status: u16) -> String {
    match status {
        400 => "Bad request".to_string(),
        401 => "Authentication required".to_string(),
        403 => "Access forbidden".to_string(),
        404 => "Resource not found".to_string(),
        408 => "Request timed out".to_string(),
        409 => "Conflict with the current state of the resource".to_string(),
        422 => "Unprocessable entity".to_string(),
        429 => "Rate limit exceeded, retry later".to_string(),
        500 => "Internal server error".to_string(),
        502 => "Bad gateway".to_string(),
        503 => "Service unavailable".to_string(),
        504 => "Gateway timeout".to_string(),
        other => format!("HTTP error {other}"),
    }
}

fn stack_frame_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^\s*at\s+.*$|\(?[\w./\\-]+\.(?:js|ts|rs):\d+(?::\d+)?\)?")
            .expect("stack frame pattern is valid")
    })
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Strips stack frames and source locations and collapses whitespace.
#[must_use]
pub fn sanitize_message(message: &str) -> String {
    let stripped = stack_frame_pattern().replace_all(message, " ");
    whitespace_pattern()
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}
