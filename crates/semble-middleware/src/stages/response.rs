//! Response processing stage.
//!
//! Requires a response from an earlier stage and attaches a processed view
//! of it. When the response metadata carries upstream GraphQL `errors`,
//! permission-denied fields are replaced with placeholder objects first.

use crate::context::PipelineContext;
use crate::middleware::{BoxFuture, Middleware};
use chrono::Utc;
use semble_core::{ErrorMapper, SembleError};
use serde_json::{json, Value};

/// Stage name.
pub const NAME: &str = "response-processing";

/// Stage priority.
pub const PRIORITY: i32 = 80;

/// Response metadata key holding upstream GraphQL errors.
pub const ERRORS_KEY: &str = "errors";

/// Attaches `processed_data` to the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseProcessingMiddleware;

impl ResponseProcessingMiddleware {
    /// Creates the stage.
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for ResponseProcessingMiddleware {
    fn process<'a>(
        &'a self,
        ctx: &'a mut PipelineContext,
    ) -> BoxFuture<'a, Result<(), SembleError>> {
        let result = match ctx.response.as_mut() {
            Some(response) => {
                let data = match response.metadata.get(ERRORS_KEY).and_then(Value::as_array) {
                    Some(errors) => ErrorMapper::process_field_permissions(&response.data, errors),
                    None => response.data.clone(),
                };
                response.processed_data = Some(json!({
                    "data": data,
                    "processed": true,
                    "processedAt": Utc::now().to_rfc3339(),
                }));
                Ok(())
            }
            None => Err(SembleError::api("No response available to process", None, None)
                .with_code("MISSING_RESPONSE")),
        };
        Box::pin(async move { result })
    }
}
