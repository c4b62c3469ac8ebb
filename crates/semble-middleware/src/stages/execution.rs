//! API execution stage.
//!
//! The upstream GraphQL client lives outside this crate, so this stage
//! synthesizes a response shaped like the requested action:
//!
//! | Action | `result` |
//! |--------|----------|
//! | `getMany` | `[]` |
//! | `create` / `update` | the request variables |
//! | `delete` | `{"deleted": true}` |
//! | anything else | `{}` |
//!
//! Hosts that talk to the real API register their own stage under this name
//! in place of this one.

use crate::context::{PipelineContext, PipelineResponse};
use crate::middleware::{BoxFuture, Middleware};
use chrono::Utc;
use semble_core::SembleError;
use serde_json::{json, Map, Value};

/// Stage name.
pub const NAME: &str = "api-execution";

/// Stage priority.
pub const PRIORITY: i32 = 50;

/// Produces a placeholder response for the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiExecutionMiddleware;

impl ApiExecutionMiddleware {
    /// Creates the stage.
    pub const fn new() -> Self {
        Self
    }
}

fn placeholder_result(action: &str, variables: &Map<String, Value>) -> Value {
    match action {
        "getMany" => Value::Array(Vec::new()),
        "create" | "update" => Value::Object(variables.clone()),
        "delete" => json!({ "deleted": true }),
        _ => Value::Object(Map::new()),
    }
}

impl Middleware for ApiExecutionMiddleware {
    fn process<'a>(
        &'a self,
        ctx: &'a mut PipelineContext,
    ) -> BoxFuture<'a, Result<(), SembleError>> {
        let resource = ctx.resource().unwrap_or_default().to_string();
        let action = ctx.action().unwrap_or_default().to_string();
        let result = placeholder_result(&action, &ctx.request.variables);

        let mut response = PipelineResponse::new(json!({
            "resource": resource,
            "action": action,
            "result": result,
        }));
        response
            .metadata
            .insert("executedAt".to_string(), Utc::now().to_rfc3339().into());
        response
            .metadata
            .insert("placeholder".to_string(), true.into());

        tracing::debug!(%resource, %action, "Placeholder response synthesized");
        ctx.response = Some(response);
        Box::pin(async { Ok(()) })
    }
}
