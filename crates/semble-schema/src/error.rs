//! Error types for the schema registry.

use semble_core::{ConfigDetails, SembleError};
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur in the schema registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The schema failed validation.
    #[error("invalid schema for '{resource_type}': {}", errors.join("; "))]
    InvalidSchema {
        /// Resource type of the rejected schema.
        resource_type: String,
        /// Validation errors.
        errors: Vec<String>,
    },

    /// The (resource type, version) pair already exists.
    #[error("schema '{resource_type}' version '{version}' is already registered")]
    DuplicateVersion {
        /// Resource type.
        resource_type: String,
        /// Version.
        version: String,
    },

    /// No schema matches the lookup.
    #[error("schema not found: {0}")]
    NotFound(String),

    /// JSON import or export failed.
    #[error("schema serialization failed: {0}")]
    Serialization(String),
}

impl RegistryError {
    /// Creates a not-found error for a type and optional version.
    pub fn not_found(resource_type: &str, version: Option<&str>) -> Self {
        match version {
            Some(version) => Self::NotFound(format!("{resource_type}@{version}")),
            None => Self::NotFound(resource_type.to_string()),
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<RegistryError> for SembleError {
    fn from(err: RegistryError) -> Self {
        let config_key = match &err {
            RegistryError::InvalidSchema { resource_type, .. }
            | RegistryError::DuplicateVersion { resource_type, .. } => Some(resource_type.clone()),
            RegistryError::NotFound(key) => Some(key.clone()),
            RegistryError::Serialization(_) => None,
        };
        SembleError::configuration(
            err.to_string(),
            ConfigDetails {
                config_key,
                ..ConfigDetails::default()
            },
        )
        .with_code("SCHEMA_REGISTRY_ERROR")
        .with_cause(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semble_core::ErrorCategory;

    #[test]
    fn test_invalid_schema_display() {
        let err = RegistryError::InvalidSchema {
            resource_type: "patient".to_string(),
            errors: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "invalid schema for 'patient': a; b");
    }

    #[test]
    fn test_into_semble_error() {
        let err: SembleError = RegistryError::not_found("patient", Some("9.9.9")).into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.code(), "SCHEMA_REGISTRY_ERROR");
    }
}
