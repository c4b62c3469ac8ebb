//! Request validation stage.
//!
//! Rejects requests before any credential lookup or upstream call:
//!
//! - the query must contain something other than whitespace
//! - `metadata.resource` must be present
//! - `metadata.action` must be present
//!
//! On success it sets `shared.requestValidated = true`.

use crate::context::PipelineContext;
use crate::middleware::{BoxFuture, Middleware};
use semble_core::{SembleError, ValidationDetails};

/// Stage name.
pub const NAME: &str = "request-validation";

/// Stage priority.
pub const PRIORITY: i32 = 10;

/// Shared-state key set once the request has been validated.
pub const VALIDATED_KEY: &str = "requestValidated";

/// Validates the query and request metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidationMiddleware;

impl RequestValidationMiddleware {
    /// Creates the stage.
    pub const fn new() -> Self {
        Self
    }

    fn validate(ctx: &PipelineContext) -> Result<(), SembleError> {
        if ctx.request.query.trim().is_empty() {
            return Err(SembleError::validation(
                "Query is required and must be a non-empty string",
                ValidationDetails::for_field("query")
                    .value(ctx.request.query.as_str())
                    .constraint("non-empty"),
            ));
        }

        if ctx.resource().is_none() {
            return Err(SembleError::validation(
                "Request metadata must include a resource",
                ValidationDetails::for_field("metadata.resource").constraint("required"),
            ));
        }

        if ctx.action().is_none() {
            return Err(SembleError::validation(
                "Request metadata must include an action",
                ValidationDetails::for_field("metadata.action").constraint("required"),
            ));
        }

        Ok(())
    }
}

impl Middleware for RequestValidationMiddleware {
    fn process<'a>(
        &'a self,
        ctx: &'a mut PipelineContext,
    ) -> BoxFuture<'a, Result<(), SembleError>> {
        let result = Self::validate(ctx).map(|()| {
            ctx.shared.insert(VALIDATED_KEY.to_string(), true.into());
        });
        Box::pin(async move { result })
    }
}
