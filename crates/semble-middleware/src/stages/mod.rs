//! Built-in pipeline stages.
//!
//! [`MiddlewarePipeline::create_with_defaults`] registers these five stages:
//!
//! | Priority | Stage | Module |
//! |----------|-------|--------|
//! | 10 | `request-validation` | [`validation`] |
//! | 20 | `permission-check` | [`permission`] |
//! | 50 | `api-execution` | [`execution`] |
//! | 80 | `response-processing` | [`response`] |
//! | 90 | `error-mapping` | [`error_mapping`] |
//!
//! Each is an ordinary registration and can be disabled, unregistered or
//! replaced like any other.
//!
//! [`MiddlewarePipeline::create_with_defaults`]: crate::MiddlewarePipeline::create_with_defaults

pub mod error_mapping;
pub mod execution;
pub mod permission;
pub mod response;
pub mod validation;

pub use error_mapping::ErrorMappingMiddleware;
pub use execution::ApiExecutionMiddleware;
pub use permission::PermissionCheckMiddleware;
pub use response::ResponseProcessingMiddleware;
pub use validation::RequestValidationMiddleware;

use crate::pipeline::{BoxedMiddleware, MiddlewarePipeline, RegisterOptions};
use std::sync::Arc;

/// Names of the built-in stages in execution order.
pub const DEFAULT_STAGES: [&str; 5] = [
    validation::NAME,
    permission::NAME,
    execution::NAME,
    response::NAME,
    error_mapping::NAME,
];

/// Registers the built-in stages, skipping any name already taken.
pub fn register_defaults(pipeline: &MiddlewarePipeline) {
    let stages: [(&str, i32, BoxedMiddleware); 5] = [
        (
            validation::NAME,
            validation::PRIORITY,
            Arc::new(RequestValidationMiddleware::new()),
        ),
        (
            permission::NAME,
            permission::PRIORITY,
            Arc::new(PermissionCheckMiddleware::new()),
        ),
        (
            execution::NAME,
            execution::PRIORITY,
            Arc::new(ApiExecutionMiddleware::new()),
        ),
        (
            response::NAME,
            response::PRIORITY,
            Arc::new(ResponseProcessingMiddleware::new()),
        ),
        (
            error_mapping::NAME,
            error_mapping::PRIORITY,
            Arc::new(ErrorMappingMiddleware::new()),
        ),
    ];

    for (name, priority, middleware) in stages {
        if let Err(err) =
            pipeline.register_boxed(name, middleware, RegisterOptions::new().priority(priority))
        {
            tracing::debug!(error = %err, "Built-in stage not registered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnMiddleware;
    use semble_config::PipelineConfig;
    use semble_events::EventSystem;

    #[test]
    fn test_defaults_registered_in_order() {
        let pipeline = MiddlewarePipeline::create_with_defaults(&PipelineConfig::default(), EventSystem::new());
        assert_eq!(pipeline.middleware_names(), DEFAULT_STAGES);
    }

    #[test]
    fn test_existing_name_is_kept() {
        let pipeline = MiddlewarePipeline::new();
        pipeline
            .register(
                execution::NAME,
                FnMiddleware::new(|_| Ok(())),
                RegisterOptions::new().priority(50),
            )
            .unwrap();
        register_defaults(&pipeline);
        assert_eq!(pipeline.len(), 5);
    }
}
