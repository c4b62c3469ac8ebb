//! Permission check stage.
//!
//! Fetches the `sembleApi` credential from the execution handle. Any failure
//! to obtain a credential carrying a token becomes a permission error, with
//! the original failure kept as its cause.

use crate::context::PipelineContext;
use crate::middleware::{BoxFuture, Middleware};
use semble_core::{PermissionDetails, SembleError, UpstreamError};
use std::sync::Arc;

/// Stage name.
pub const NAME: &str = "permission-check";

/// Stage priority.
pub const PRIORITY: i32 = 20;

/// Credential type looked up on the execution handle.
pub const CREDENTIAL_NAME: &str = semble_core::CREDENTIAL_TYPE;

/// Shared-state key set once credentials have been verified.
pub const VERIFIED_KEY: &str = "credentialsVerified";

/// Verifies that API credentials are available.
#[derive(Debug, Clone)]
pub struct PermissionCheckMiddleware {
    credential_name: String,
}

impl Default for PermissionCheckMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionCheckMiddleware {
    /// Checks the `sembleApi` credential.
    pub fn new() -> Self {
        Self::for_credential(CREDENTIAL_NAME)
    }

    /// Checks a differently named credential.
    pub fn for_credential(name: impl Into<String>) -> Self {
        Self {
            credential_name: name.into(),
        }
    }

    fn denied(&self, ctx: &PipelineContext, message: String) -> SembleError {
        let mut details = PermissionDetails::new(format!("credentials:{}", self.credential_name));
        if let Some(action) = ctx.action() {
            details = details.operation(action);
        }
        SembleError::permission(message, details)
    }
}

impl Middleware for PermissionCheckMiddleware {
    fn process<'a>(
        &'a self,
        ctx: &'a mut PipelineContext,
    ) -> BoxFuture<'a, Result<(), SembleError>> {
        Box::pin(async move {
            let execution = Arc::clone(&ctx.execution);
            let credentials = match execution.get_credentials(&self.credential_name).await {
                Ok(credentials) => credentials,
                Err(err) => {
                    let message = format!("Permission check failed: {}", err.message());
                    return Err(self.denied(ctx, message).with_cause(err));
                }
            };

            if !credentials.has_token() {
                let message = format!(
                    "Permission check failed: '{}' credentials have no API token",
                    self.credential_name
                );
                return Err(self
                    .denied(ctx, message)
                    .with_cause(UpstreamError("missing API token".to_string())));
            }

            tracing::debug!(credential = %self.credential_name, "Credentials verified");
            ctx.shared.insert(VERIFIED_KEY.to_string(), true.into());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Credentials, PipelineRequest, StaticCredentials};
    use semble_core::ErrorCategory;

    fn context(handle: StaticCredentials) -> PipelineContext {
        PipelineContext::new(
            Arc::new(handle),
            PipelineRequest::new("query { patients { id } }", "patients", "getMany"),
        )
    }

    #[tokio::test]
    async fn test_token_present() {
        let mut ctx = context(StaticCredentials::new().with(CREDENTIAL_NAME, Credentials::token("abc")));
        PermissionCheckMiddleware::new().process(&mut ctx).await.unwrap();
        assert_eq!(ctx.shared[VERIFIED_KEY], true);
    }

    #[tokio::test]
    async fn test_missing_credentials_become_permission_error() {
        let mut ctx = context(StaticCredentials::new());
        let err = PermissionCheckMiddleware::new()
            .process(&mut ctx)
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Permission);
        assert!(err.message().starts_with("Permission check failed"));
        assert!(err.cause().is_some());
        assert!(ctx.shared.get(VERIFIED_KEY).is_none());
    }

    #[tokio::test]
    async fn test_empty_token_rejected() {
        let mut ctx = context(StaticCredentials::new().with(CREDENTIAL_NAME, Credentials::default()));
        let err = PermissionCheckMiddleware::new()
            .process(&mut ctx)
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Permission);
        assert!(err.message().contains("no API token"));
    }

    #[tokio::test]
    async fn test_custom_credential_name() {
        let mut ctx = context(StaticCredentials::new().with("other", Credentials::token("t")));
        PermissionCheckMiddleware::for_credential("other")
            .process(&mut ctx)
            .await
            .unwrap();
    }
}
