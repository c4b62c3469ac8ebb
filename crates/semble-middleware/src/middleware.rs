//! Core middleware trait.
//!
//! Every stage implements [`Middleware`]. A stage works on the shared
//! [`PipelineContext`] and returns `Err` to fail; the pipeline decides
//! whether that aborts the execution or is recorded and skipped over.
//!
//! # Example
//!
//! ```
//! use semble_middleware::{BoxFuture, Middleware, PipelineContext};
//! use semble_core::SembleError;
//!
//! struct Audit;
//!
//! impl Middleware for Audit {
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut PipelineContext,
//!     ) -> BoxFuture<'a, Result<(), SembleError>> {
//!         Box::pin(async move {
//!             ctx.shared.insert("audited".to_string(), true.into());
//!             Ok(())
//!         })
//!     }
//! }
//! ```

use crate::context::PipelineContext;
use semble_core::SembleError;
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A pipeline stage.
///
/// Stages run strictly one at a time and must not keep references to the
/// context past the returned future.
pub trait Middleware: Send + Sync + 'static {
    /// Runs this stage against the context.
    fn process<'a>(&'a self, ctx: &'a mut PipelineContext)
        -> BoxFuture<'a, Result<(), SembleError>>;
}

/// A middleware built from a synchronous closure.
///
/// # Example
///
/// ```
/// use semble_middleware::FnMiddleware;
///
/// let stamp = FnMiddleware::new(|ctx| {
///     ctx.shared.insert("stamped".to_string(), true.into());
///     Ok(())
/// });
/// # let _ = stamp;
/// ```
pub struct FnMiddleware<F> {
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&mut PipelineContext) -> Result<(), SembleError> + Send + Sync + 'static,
{
    /// Creates a new function-based middleware.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut PipelineContext) -> Result<(), SembleError> + Send + Sync + 'static,
{
    fn process<'a>(
        &'a self,
        ctx: &'a mut PipelineContext,
    ) -> BoxFuture<'a, Result<(), SembleError>> {
        let result = (self.func)(ctx);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{PipelineRequest, StaticCredentials};
    use std::sync::Arc;

    fn context() -> PipelineContext {
        PipelineContext::new(
            Arc::new(StaticCredentials::new()),
            PipelineRequest::new("query", "patients", "get"),
        )
    }

    #[tokio::test]
    async fn test_fn_middleware_mutates_context() {
        let mw = FnMiddleware::new(|ctx: &mut PipelineContext| {
            ctx.shared.insert("seen".to_string(), 1.into());
            Ok(())
        });

        let mut ctx = context();
        mw.process(&mut ctx).await.unwrap();
        assert_eq!(ctx.shared["seen"], 1);
    }

    #[tokio::test]
    async fn test_fn_middleware_error() {
        let mw = FnMiddleware::new(|_: &mut PipelineContext| Err(SembleError::new("boom")));
        let err = mw.process(&mut context()).await.unwrap_err();
        assert_eq!(err.message(), "boom");
    }
}
