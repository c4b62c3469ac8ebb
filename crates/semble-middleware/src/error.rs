//! Pipeline registration errors.

use semble_core::{ConfigDetails, SembleError};
use thiserror::Error;

/// Errors returned by pipeline registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A middleware with this name is already registered.
    #[error("middleware '{name}' is already registered")]
    DuplicateMiddleware {
        /// The conflicting name.
        name: String,
    },
}

impl From<PipelineError> for SembleError {
    fn from(err: PipelineError) -> Self {
        let PipelineError::DuplicateMiddleware { name } = &err;
        SembleError::configuration(
            err.to_string(),
            ConfigDetails {
                config_key: Some(name.clone()),
                ..ConfigDetails::default()
            },
        )
        .with_code("PIPELINE_ERROR")
        .with_cause(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semble_core::ErrorCategory;

    #[test]
    fn test_into_semble_error() {
        let err: SembleError = PipelineError::DuplicateMiddleware {
            name: "audit".to_string(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.message(), "middleware 'audit' is already registered");
    }
}
