//! Error types for the Semble integration layer.
//!
//! This module provides the [`SembleError`] type, which is the standard error
//! type used by every component of the integration layer.
//!
//! # Categories and subtypes
//!
//! Every error carries an [`ErrorCategory`] and an [`ErrorSeverity`]. The
//! subtype-specific data lives in [`ErrorDetails`]:
//!
//! | Subtype | Category | Default code | Extra data |
//! |---|---|---|---|
//! | generic | `unknown` | `GENERIC_ERROR` | - |
//! | API | `api` | `API_ERROR` | status code, raw response |
//! | authentication | `authentication` | `AUTHENTICATION_ERROR` | credential kind, hint |
//! | permission | `permission` | `PERMISSION_DENIED` | permission, field, operation |
//! | validation | `validation` | `VALIDATION_ERROR` | field, value, constraints |
//! | configuration | `configuration` | `CONFIGURATION_ERROR` | key, expected type, actual value |
//! | network | `network` | `NETWORK_ERROR` | url, timeout |
//!
//! Severity only selects the log level (see [`ErrorSeverity::log_level`]); it
//! never changes control flow.
//!
//! # Serialization
//!
//! [`SembleError::to_json`] produces a flat [`SerializedError`]. Subtype
//! fields (status code, field name, required permission, ...) are not part of
//! that object.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

/// Result type alias using [`SembleError`].
pub type SembleResult<T> = Result<T, SembleError>;

/// Shared, type-erased error used as the nested cause of a [`SembleError`].
pub type ErrorCause = Arc<dyn StdError + Send + Sync>;

/// Default code for errors built with [`SembleError::new`].
pub const GENERIC_ERROR: &str = "GENERIC_ERROR";

/// Code for errors that could not be classified.
pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";

/// Code carried by rate-limited API errors.
pub const RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";

/// Message used when an unclassified error has no message of its own.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Upstream API returned an error.
    Api,
    /// Credentials missing, invalid or expired.
    Authentication,
    /// Caller lacks a permission.
    Permission,
    /// Input failed validation.
    Validation,
    /// Misconfiguration of the integration layer or its collaborators.
    Configuration,
    /// Transport-level failure.
    Network,
    /// Anything else.
    #[default]
    Unknown,
}

impl ErrorCategory {
    /// Returns the wire name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Authentication => "authentication",
            Self::Permission => "permission",
            Self::Validation => "validation",
            Self::Configuration => "configuration",
            Self::Network => "network",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious an error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Informational.
    Low,
    /// Worth a warning.
    #[default]
    Medium,
    /// Needs attention.
    High,
    /// Needs attention now.
    Critical,
}

impl ErrorSeverity {
    /// Returns the wire name of the severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Returns the log level used for errors of this severity.
    #[must_use]
    pub const fn log_level(self) -> Level {
        match self {
            Self::Critical | Self::High => Level::ERROR,
            Self::Medium => Level::WARN,
            Self::Low => Level::INFO,
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an error happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    /// Operation being performed (e.g. `getMany`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Resource being accessed (e.g. `patients`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// User on whose behalf the call was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Correlation id of the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ErrorContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the operation.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the resource.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Sets the user id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Sets the request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operation.is_none()
            && self.resource.is_none()
            && self.user_id.is_none()
            && self.request_id.is_none()
            && self.metadata.is_empty()
    }
}

/// Extra data of an API error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiDetails {
    /// HTTP status code, when known.
    pub status_code: Option<u16>,
    /// Raw upstream response body.
    pub response: Option<Value>,
}

/// Extra data of an authentication error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthDetails {
    /// Kind of credential involved (e.g. `sembleApi`).
    pub credential_type: Option<String>,
    /// How the user can fix the problem.
    pub hint: Option<String>,
}

/// Extra data of a permission error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PermissionDetails {
    /// The permission that was missing.
    pub required_permission: String,
    /// Field the permission guards, if field-level.
    pub field: Option<String>,
    /// Operation that was attempted.
    pub operation: Option<String>,
}

impl PermissionDetails {
    /// Creates details for a missing permission.
    #[must_use]
    pub fn new(required_permission: impl Into<String>) -> Self {
        Self {
            required_permission: required_permission.into(),
            ..Self::default()
        }
    }

    /// Sets the guarded field.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Sets the attempted operation.
    #[must_use]
    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }
}

/// Extra data of a validation error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationDetails {
    /// Field that failed validation.
    pub field: Option<String>,
    /// Rejected value.
    pub value: Option<Value>,
    /// Human-readable descriptions of the violated constraints.
    pub constraints: Vec<String>,
}

impl ValidationDetails {
    /// Creates details for a failing field.
    #[must_use]
    pub fn for_field(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::default()
        }
    }

    /// Sets the rejected value.
    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Adds a violated constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }
}

/// Extra data of a configuration error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDetails {
    /// Offending configuration key.
    pub config_key: Option<String>,
    /// Type the key should have.
    pub expected_type: Option<String>,
    /// Value that was found.
    pub actual_value: Option<Value>,
}

/// Extra data of a network error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkDetails {
    /// URL that was being contacted.
    pub url: Option<String>,
    /// Timeout that elapsed, if the failure was a timeout.
    pub timeout: Option<Duration>,
}

/// Subtype-specific data of a [`SembleError`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ErrorDetails {
    /// Plain error without extra data.
    #[default]
    Generic,
    /// Upstream API error.
    Api(ApiDetails),
    /// Authentication error.
    Authentication(AuthDetails),
    /// Permission error.
    Permission(PermissionDetails),
    /// Validation error.
    Validation(ValidationDetails),
    /// Configuration error.
    Configuration(ConfigDetails),
    /// Network error.
    Network(NetworkDetails),
}

impl ErrorDetails {
    /// Returns the type name used in serialized output.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Generic => "SembleError",
            Self::Api(_) => "SembleApiError",
            Self::Authentication(_) => "SembleAuthError",
            Self::Permission(_) => "SemblePermissionError",
            Self::Validation(_) => "SembleValidationError",
            Self::Configuration(_) => "SembleConfigError",
            Self::Network(_) => "SembleNetworkError",
        }
    }
}

/// Error from an upstream collaborator, kept as the cause of a typed error.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct UpstreamError(pub String);

/// Standard error type for the integration layer.
///
/// Errors are immutable once built; the consuming `with_*` methods are meant
/// to be chained at construction time.
///
/// # Example
///
/// ```
/// use semble_core::{ErrorCategory, PermissionDetails, SembleError};
///
/// let err = SembleError::permission(
///     "Access denied",
///     PermissionDetails::new("patients.read").field("dob"),
/// );
/// assert_eq!(err.category(), ErrorCategory::Permission);
/// assert!(!err.is_retryable());
/// assert_eq!(
///     err.user_message(),
///     "Missing required permission 'patients.read' for field 'dob'"
/// );
/// ```
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SembleError {
    message: String,
    code: String,
    category: ErrorCategory,
    severity: ErrorSeverity,
    context: ErrorContext,
    timestamp: DateTime<Utc>,
    details: ErrorDetails,
    #[source]
    cause: Option<ErrorCause>,
}

impl SembleError {
    /// Creates a generic error with default code, category and severity.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: GENERIC_ERROR.to_string(),
            category: ErrorCategory::Unknown,
            severity: ErrorSeverity::Medium,
            context: ErrorContext::default(),
            timestamp: Utc::now(),
            details: ErrorDetails::Generic,
            cause: None,
        }
    }

    fn with_details(
        message: impl Into<String>,
        code: &str,
        category: ErrorCategory,
        severity: ErrorSeverity,
        details: ErrorDetails,
    ) -> Self {
        Self {
            code: code.to_string(),
            category,
            severity,
            details,
            ..Self::new(message)
        }
    }

    /// Creates an API error.
    #[must_use]
    pub fn api(message: impl Into<String>, status_code: Option<u16>, response: Option<Value>) -> Self {
        let severity = match status_code {
            Some(status) if status >= 500 => ErrorSeverity::High,
            _ => ErrorSeverity::Medium,
        };
        Self::with_details(
            message,
            "API_ERROR",
            ErrorCategory::Api,
            severity,
            ErrorDetails::Api(ApiDetails {
                status_code,
                response,
            }),
        )
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>, details: AuthDetails) -> Self {
        Self::with_details(
            message,
            "AUTHENTICATION_ERROR",
            ErrorCategory::Authentication,
            ErrorSeverity::High,
            ErrorDetails::Authentication(details),
        )
    }

    /// Creates a permission error.
    #[must_use]
    pub fn permission(message: impl Into<String>, details: PermissionDetails) -> Self {
        Self::with_details(
            message,
            "PERMISSION_DENIED",
            ErrorCategory::Permission,
            ErrorSeverity::Medium,
            ErrorDetails::Permission(details),
        )
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>, details: ValidationDetails) -> Self {
        Self::with_details(
            message,
            "VALIDATION_ERROR",
            ErrorCategory::Validation,
            ErrorSeverity::Low,
            ErrorDetails::Validation(details),
        )
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>, details: ConfigDetails) -> Self {
        Self::with_details(
            message,
            "CONFIGURATION_ERROR",
            ErrorCategory::Configuration,
            ErrorSeverity::High,
            ErrorDetails::Configuration(details),
        )
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>, details: NetworkDetails) -> Self {
        Self::with_details(
            message,
            "NETWORK_ERROR",
            ErrorCategory::Network,
            ErrorSeverity::Medium,
            ErrorDetails::Network(details),
        )
    }

    /// Wraps another error under a new message.
    #[must_use]
    pub fn wrap(cause: impl StdError + Send + Sync + 'static, message: impl Into<String>) -> Self {
        Self::new(message).with_cause(cause)
    }

    /// Overrides the machine code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Overrides the category.
    #[must_use]
    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = category;
        self
    }

    /// Overrides the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Replaces the context.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    /// Attaches a nested cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Attaches an already shared cause.
    #[must_use]
    pub fn with_shared_cause(mut self, cause: ErrorCause) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the machine code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    /// Returns the context.
    #[must_use]
    pub const fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Returns when the error was created.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the subtype data.
    #[must_use]
    pub const fn details(&self) -> &ErrorDetails {
        &self.details
    }

    /// Returns the nested cause.
    #[must_use]
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }

    /// Returns the HTTP status code for API errors.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match &self.details {
            ErrorDetails::Api(api) => api.status_code,
            _ => None,
        }
    }

    /// Returns whether an external caller may retry the failed call.
    ///
    /// API errors are retryable only for 429 and 5xx statuses.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match &self.details {
            ErrorDetails::Api(api) => {
                matches!(api.status_code, Some(status) if status == 429 || status >= 500)
            }
            _ => self.category == ErrorCategory::Network || self.code == RATE_LIMIT_EXCEEDED,
        }
    }

    /// Returns the message to show to an end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match &self.details {
            ErrorDetails::Authentication(AuthDetails {
                hint: Some(hint), ..
            }) => format!("{} - {}", self.message, hint),
            ErrorDetails::Permission(permission) => {
                let mut message = format!(
                    "Missing required permission '{}'",
                    permission.required_permission
                );
                if let Some(field) = &permission.field {
                    message.push_str(&format!(" for field '{field}'"));
                }
                if let Some(operation) = &permission.operation {
                    message.push_str(&format!(" in operation '{operation}'"));
                }
                message
            }
            ErrorDetails::Validation(ValidationDetails {
                field: Some(field),
                constraints,
                ..
            }) if !constraints.is_empty() => {
                format!("{} for '{}': {}", self.message, field, constraints.join(", "))
            }
            ErrorDetails::Configuration(ConfigDetails {
                config_key: Some(key),
                ..
            }) => format!("Configuration error for '{}': {}", key, self.message),
            _ => self.message.clone(),
        }
    }

    /// Serializes the error into a flat object for logging and telemetry.
    ///
    /// Subtype data is not included.
    #[must_use]
    pub fn to_json(&self) -> SerializedError {
        SerializedError {
            name: self.details.type_name().to_string(),
            message: self.message.clone(),
            code: self.code.clone(),
            category: self.category,
            severity: self.severity,
            context: self.context.clone(),
            timestamp: self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            stack: self.stack(),
        }
    }

    /// Renders the error followed by its chain of causes.
    #[must_use]
    pub fn stack(&self) -> String {
        let mut stack = format!("{}: {}", self.details.type_name(), self.message);
        let mut source = StdError::source(self);
        while let Some(cause) = source {
            stack.push_str(&format!("\n    caused by: {cause}"));
            source = cause.source();
        }
        stack
    }

    /// Logs the error at the level implied by its severity.
    pub fn log(&self) {
        let level = self.severity.log_level();
        if level == Level::ERROR {
            tracing::error!(code = %self.code, category = %self.category, severity = %self.severity, "{}", self.message);
        } else if level == Level::WARN {
            tracing::warn!(code = %self.code, category = %self.category, severity = %self.severity, "{}", self.message);
        } else {
            tracing::info!(code = %self.code, category = %self.category, severity = %self.severity, "{}", self.message);
        }
    }
}

/// Flat, serializable form of a [`SembleError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedError {
    /// Subtype name.
    pub name: String,
    /// Human-readable message.
    pub message: String,
    /// Machine code.
    pub code: String,
    /// Category.
    pub category: ErrorCategory,
    /// Severity.
    pub severity: ErrorSeverity,
    /// Context.
    pub context: ErrorContext,
    /// ISO-8601 creation time.
    pub timestamp: String,
    /// Error and cause chain.
    pub stack: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let error = SembleError::new("boom");
        assert_eq!(error.message(), "boom");
        assert_eq!(error.code(), GENERIC_ERROR);
        assert_eq!(error.category(), ErrorCategory::Unknown);
        assert_eq!(error.severity(), ErrorSeverity::Medium);
        assert!(error.context().is_empty());
        assert!(error.cause().is_none());
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn test_api_retryability() {
        assert!(SembleError::api("slow down", Some(429), None).is_retryable());
        assert!(SembleError::api("down", Some(503), None).is_retryable());
        assert!(!SembleError::api("bad", Some(400), None).is_retryable());
        assert!(!SembleError::api("missing", Some(404), None).is_retryable());
        assert!(!SembleError::api("unknown", None, None).is_retryable());
    }

    #[test]
    fn test_category_retryability() {
        assert!(SembleError::network("refused", NetworkDetails::default()).is_retryable());
        assert!(SembleError::new("limited").with_code(RATE_LIMIT_EXCEEDED).is_retryable());
        assert!(!SembleError::authentication("no", AuthDetails::default()).is_retryable());
        assert!(!SembleError::permission("no", PermissionDetails::new("x")).is_retryable());
        assert!(!SembleError::validation("no", ValidationDetails::default()).is_retryable());
        assert!(!SembleError::configuration("no", ConfigDetails::default()).is_retryable());
        assert!(!SembleError::new("no").is_retryable());
    }

    #[test]
    fn test_auth_user_message() {
        let plain = SembleError::authentication("Token expired", AuthDetails::default());
        assert_eq!(plain.user_message(), "Token expired");

        let hinted = SembleError::authentication(
            "Token expired",
            AuthDetails {
                credential_type: Some("sembleApi".to_string()),
                hint: Some("Generate a new token".to_string()),
            },
        );
        assert_eq!(hinted.user_message(), "Token expired - Generate a new token");
    }

    #[test]
    fn test_permission_user_message_order() {
        let bare = SembleError::permission("denied", PermissionDetails::new("patients.read"));
        assert_eq!(bare.user_message(), "Missing required permission 'patients.read'");

        let full = SembleError::permission(
            "denied",
            PermissionDetails::new("patients.read")
                .operation("getMany")
                .field("medicalHistory"),
        );
        assert_eq!(
            full.user_message(),
            "Missing required permission 'patients.read' for field 'medicalHistory' in operation 'getMany'"
        );

        let op_only =
            SembleError::permission("denied", PermissionDetails::new("bookings.write").operation("create"));
        assert_eq!(
            op_only.user_message(),
            "Missing required permission 'bookings.write' in operation 'create'"
        );
    }

    #[test]
    fn test_validation_user_message() {
        let with_constraints = SembleError::validation(
            "Invalid input",
            ValidationDetails::for_field("email")
                .value("nope")
                .constraint("must be an email")
                .constraint("must not be empty"),
        );
        assert_eq!(
            with_constraints.user_message(),
            "Invalid input for 'email': must be an email, must not be empty"
        );

        let without_constraints =
            SembleError::validation("Invalid input", ValidationDetails::for_field("email"));
        assert_eq!(without_constraints.user_message(), "Invalid input");

        let without_field = SembleError::validation(
            "Invalid input",
            ValidationDetails::default().constraint("required"),
        );
        assert_eq!(without_field.user_message(), "Invalid input");
    }

    #[test]
    fn test_config_user_message() {
        let keyed = SembleError::configuration(
            "expected a number",
            ConfigDetails {
                config_key: Some("timeoutMs".to_string()),
                expected_type: Some("number".to_string()),
                actual_value: Some(json!("soon")),
            },
        );
        assert_eq!(
            keyed.user_message(),
            "Configuration error for 'timeoutMs': expected a number"
        );

        let unkeyed = SembleError::configuration("broken", ConfigDetails::default());
        assert_eq!(unkeyed.user_message(), "broken");
    }

    #[test]
    fn test_to_json_omits_subtype_fields() {
        let error = SembleError::api("Not found", Some(404), Some(json!({"x": 1})))
            .with_context(ErrorContext::new().with_resource("patients"));
        let value = serde_json::to_value(error.to_json()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["name"], "SembleApiError");
        assert_eq!(object["code"], "API_ERROR");
        assert_eq!(object["category"], "api");
        assert_eq!(object["severity"], "medium");
        assert_eq!(object["context"]["resource"], "patients");
        assert!(object["timestamp"].as_str().unwrap().ends_with('Z'));
        assert!(!object.contains_key("statusCode"));
        assert!(!object.contains_key("status_code"));
        assert!(!object.contains_key("response"));
        assert_eq!(object.len(), 8);
    }

    #[test]
    fn test_wrap_exposes_source() {
        let inner = SembleError::network("connection refused", NetworkDetails::default());
        let outer = SembleError::wrap(inner, "request failed");

        let source = StdError::source(&outer).expect("wrapped error has a source");
        assert_eq!(source.to_string(), "connection refused");
        assert!(outer.stack().contains("caused by: connection refused"));
    }

    #[test]
    fn test_severity_log_levels() {
        assert_eq!(ErrorSeverity::Critical.log_level(), Level::ERROR);
        assert_eq!(ErrorSeverity::High.log_level(), Level::ERROR);
        assert_eq!(ErrorSeverity::Medium.log_level(), Level::WARN);
        assert_eq!(ErrorSeverity::Low.log_level(), Level::INFO);
    }

    #[test]
    fn test_api_severity_from_status() {
        assert_eq!(SembleError::api("x", Some(502), None).severity(), ErrorSeverity::High);
        assert_eq!(SembleError::api("x", Some(400), None).severity(), ErrorSeverity::Medium);
    }
}
