//! Error mapping stage.
//!
//! The last built-in stage. It only does work when an earlier stage left an
//! error on the context, which happens when the pipeline runs with
//! `continue_on_error`. Errors that already carry a category pass through;
//! uncategorized ones are rewritten by matching their message:
//!
//! | Message contains | Result |
//! |------------------|--------|
//! | `permission`, `unauthorized` | permission error |
//! | `timeout` | network error, code `TIMEOUT` |
//! | `network`, `connection` | network error |
//! | anything else | `Pipeline execution failed: …` |
//!
//! The original error is kept as the cause of the rewritten one.

use crate::context::PipelineContext;
use crate::middleware::{BoxFuture, Middleware};
use semble_core::{ErrorCategory, NetworkDetails, PermissionDetails, SembleError};
use semble_telemetry::metrics::record_error;

/// Stage name.
pub const NAME: &str = "error-mapping";

/// Stage priority.
pub const PRIORITY: i32 = 90;

/// Rewrites the context error into a user-facing category.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorMappingMiddleware;

impl ErrorMappingMiddleware {
    /// Creates the stage.
    pub const fn new() -> Self {
        Self
    }

    /// Maps a single error.
    pub fn map(err: SembleError) -> SembleError {
        if err.category() != ErrorCategory::Unknown {
            return err;
        }

        let message = err.message().to_lowercase();
        let mapped = if message.contains("permission") || message.contains("unauthorized") {
            SembleError::permission(
                format!("Permission denied: {}", err.message()),
                PermissionDetails::new("unknown"),
            )
        } else if message.contains("timeout") {
            SembleError::network(
                format!("Request timed out: {}", err.message()),
                NetworkDetails::default(),
            )
            .with_code("TIMEOUT")
        } else if message.contains("network") || message.contains("connection") {
            SembleError::network(
                format!("Network error: {}", err.message()),
                NetworkDetails::default(),
            )
        } else {
            SembleError::new(format!("Pipeline execution failed: {}", err.message()))
                .with_code("PIPELINE_ERROR")
        };

        mapped.with_context(err.context().clone()).with_cause(err)
    }
}

impl Middleware for ErrorMappingMiddleware {
    fn process<'a>(
        &'a self,
        ctx: &'a mut PipelineContext,
    ) -> BoxFuture<'a, Result<(), SembleError>> {
        if let Some(err) = ctx.error.take() {
            let mut mapped = Self::map(err);
            if mapped.context().is_empty() {
                mapped = mapped.with_context(ctx.error_context());
            }
            record_error(mapped.category().as_str(), mapped.code());
            mapped.log();
            ctx.error = Some(mapped);
        }
        Box::pin(async { Ok(()) })
    }
}
