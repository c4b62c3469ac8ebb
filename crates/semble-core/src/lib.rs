//! # Semble Core
//!
//! Core types for the Semble integration layer.
//!
//! - [`SembleError`] - Standard error type with category, severity and context
//! - [`ErrorFactory`] - Classifies arbitrary upstream failures
//! - [`ErrorMapper`] - Maps GraphQL and HTTP failures, redacts denied fields
//! - [`Container`] - Named dependency injection with lifetimes and scopes

#![doc(html_root_url = "https://docs.rs/semble-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod di;
mod error;
mod factory;
mod mapper;
mod raw;

pub use di::{Container, ContainerError, Dependencies, Inject, Lifetime, ScopedContainer};
pub use error::{
    ApiDetails, AuthDetails, ConfigDetails, ErrorCategory, ErrorCause, ErrorContext, ErrorDetails,
    ErrorSeverity, NetworkDetails, PermissionDetails, SembleError, SembleResult, SerializedError,
    UpstreamError, ValidationDetails, GENERIC_ERROR, RATE_LIMIT_EXCEEDED, UNKNOWN_ERROR,
    UNKNOWN_ERROR_MESSAGE,
};
pub use factory::{Classifier, ErrorFactory};
pub use mapper::{
    default_status_message, sanitize_message, ErrorMapper, MappingStrategy, AUTH_HINT,
    CREDENTIAL_TYPE, PERMISSION_DENIED,
};
pub use raw::{
    RawError, ERROR_MESSAGE_MARKER, FIELD_NAME_MARKER, MISSING_PERMISSION_MARKER,
    NETWORK_ERROR_CODES,
};
