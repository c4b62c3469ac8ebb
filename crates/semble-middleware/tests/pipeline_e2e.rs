//! End-to-end pipeline tests.
//!
//! Covers ordering, abort and continue semantics, the deadline, and the
//! built-in stage chain against a static credential store.

use parking_lot::Mutex;
use proptest::prelude::*;
use semble_config::PipelineConfig;
use semble_core::{ErrorCategory, SembleError};
use semble_events::{types, EventSystem};
use semble_middleware::{
    stages::{self, DEFAULT_STAGES},
    BoxFuture, Credentials, ExecutionOptions, ExecutionStatus, FnMiddleware, Middleware,
    MiddlewarePipeline, PipelineContext, PipelineError, PipelineRequest, RegisterOptions,
    StaticCredentials,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

type Log = Arc<Mutex<Vec<String>>>;

fn context_with(handle: StaticCredentials, request: PipelineRequest) -> PipelineContext {
    PipelineContext::new(Arc::new(handle), request)
}

fn patients_request() -> PipelineRequest {
    PipelineRequest::new("query { patients { id firstName } }", "patients", "getMany")
}

fn authorized() -> StaticCredentials {
    StaticCredentials::new().with("sembleApi", Credentials::token("test-token"))
}

fn recording(log: &Log, name: &str) -> impl Middleware {
    let log = Arc::clone(log);
    let name = name.to_string();
    FnMiddleware::new(move |_| {
        log.lock().push(name.clone());
        Ok(())
    })
}

fn failing(message: &'static str) -> impl Middleware {
    FnMiddleware::new(move |_| Err(SembleError::new(message)))
}

struct Slow(Duration);

impl Middleware for Slow {
    fn process<'a>(
        &'a self,
        _ctx: &'a mut PipelineContext,
    ) -> BoxFuture<'a, Result<(), SembleError>> {
        Box::pin(async move {
            tokio::time::sleep(self.0).await;
            Ok(())
        })
    }
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test]
async fn test_stages_run_in_priority_order() {
    let pipeline = MiddlewarePipeline::new();
    let log = Log::default();
    for (name, priority) in [("late", 100), ("early", 10), ("middle", 50)] {
        pipeline
            .register(name, recording(&log, name), RegisterOptions::new().priority(priority))
            .unwrap();
    }

    let mut ctx = context_with(StaticCredentials::new(), patients_request());
    let result = pipeline.execute(&mut ctx, ExecutionOptions::default()).await;

    assert!(result.success);
    assert_eq!(*log.lock(), ["early", "middle", "late"]);
    let traced: Vec<&str> = result.middleware_trace.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(traced, ["early", "middle", "late"]);
}

proptest! {
    #[test]
    fn prop_registration_order_is_stable_sort(priorities in prop::collection::vec(-5i32..5, 0..12)) {
        let pipeline = MiddlewarePipeline::new();
        for (index, priority) in priorities.iter().enumerate() {
            pipeline
                .register(format!("m{index}"), FnMiddleware::new(|_| Ok(())), RegisterOptions::new().priority(*priority))
                .unwrap();
        }

        let mut expected: Vec<(i32, usize)> = priorities.iter().copied().zip(0..).collect();
        expected.sort_by_key(|(priority, _)| *priority);
        let expected: Vec<String> = expected.into_iter().map(|(_, index)| format!("m{index}")).collect();

        prop_assert_eq!(pipeline.middleware_names(), expected);
    }
}

#[tokio::test]
async fn test_duplicate_name_rejected() {
    let pipeline = MiddlewarePipeline::new();
    let log = Log::default();
    pipeline
        .register("audit", recording(&log, "first"), RegisterOptions::new().priority(60))
        .unwrap();
    pipeline
        .register("tail", recording(&log, "tail"), RegisterOptions::new().priority(70))
        .unwrap();

    let err = pipeline
        .register("audit", failing("never"), RegisterOptions::new().priority(1))
        .unwrap_err();
    assert!(matches!(err, PipelineError::DuplicateMiddleware { ref name } if name == "audit"));
    assert_eq!(pipeline.len(), 2);

    let mut ctx = context_with(StaticCredentials::new(), patients_request());
    let result = pipeline.execute(&mut ctx, ExecutionOptions::default()).await;
    assert!(result.success);
    assert_eq!(*log.lock(), ["first", "tail"]);
    assert_eq!(pipeline.middleware_names(), ["audit", "tail"]);
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn test_abort_trace_ends_at_failing_stage() {
    let events = EventSystem::new();
    let pipeline = MiddlewarePipeline::with_event_system(events.clone());
    let log = Log::default();
    pipeline.register("a", recording(&log, "a"), RegisterOptions::new().priority(1)).unwrap();
    pipeline.register("b", recording(&log, "b"), RegisterOptions::new().priority(2)).unwrap();
    pipeline.register("c", failing("upstream exploded"), RegisterOptions::new().priority(3)).unwrap();
    pipeline.register("d", recording(&log, "d"), RegisterOptions::new().priority(4)).unwrap();

    let mut ctx = context_with(StaticCredentials::new(), patients_request());
    let result = pipeline.execute(&mut ctx, ExecutionOptions::default()).await;

    assert!(!result.success);
    assert_eq!(result.status, ExecutionStatus::Failed);
    assert_eq!(result.middleware_trace.len(), 3);
    assert_eq!(result.middleware_trace[2].error.as_deref(), Some("upstream exploded"));
    assert_eq!(*log.lock(), ["a", "b"]);

    let failed = events.history(Some(types::PIPELINE_FAILED), None);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].get("middleware"), Some(&json!("c")));
}

#[tokio::test]
async fn test_continue_traces_every_stage() {
    let pipeline = MiddlewarePipeline::new();
    let log = Log::default();
    pipeline.register("a", recording(&log, "a"), RegisterOptions::new().priority(1)).unwrap();
    pipeline.register("b", failing("bad"), RegisterOptions::new().priority(2)).unwrap();
    pipeline.register("c", recording(&log, "c"), RegisterOptions::new().priority(3)).unwrap();

    let mut ctx = context_with(StaticCredentials::new(), patients_request());
    let result = pipeline
        .execute(&mut ctx, ExecutionOptions::default().continue_on_error(true))
        .await;

    assert_eq!(result.status, ExecutionStatus::CompletedWithErrors);
    let outcomes: Vec<bool> = result.middleware_trace.iter().map(|t| t.success).collect();
    assert_eq!(outcomes, [true, false, true]);
    assert_eq!(*log.lock(), ["a", "c"]);
    assert_eq!(ctx.error.unwrap().message(), "bad");
}

#[tokio::test]
async fn test_empty_pipeline() {
    let pipeline = MiddlewarePipeline::new();
    let mut ctx = context_with(StaticCredentials::new(), patients_request());
    let result = pipeline.execute_with_defaults(&mut ctx).await;
    assert!(result.success);
    assert!(result.middleware_trace.is_empty());
}

#[tokio::test]
async fn test_deadline_applies_to_whole_execution() {
    let pipeline = MiddlewarePipeline::new();
    pipeline
        .register("slow-1", Slow(Duration::from_millis(40)), RegisterOptions::new().priority(1))
        .unwrap();
    pipeline
        .register("slow-2", Slow(Duration::from_millis(40)), RegisterOptions::new().priority(2))
        .unwrap();
    pipeline
        .register("never", failing("unreachable"), RegisterOptions::new().priority(3))
        .unwrap();

    let mut ctx = context_with(StaticCredentials::new(), patients_request());
    let result = pipeline
        .execute(&mut ctx, ExecutionOptions::default().timeout(Duration::from_millis(60)))
        .await;

    assert_eq!(result.status, ExecutionStatus::Failed);
    assert_eq!(result.middleware_trace.len(), 3);
    assert!(result.middleware_trace[0].success);
    assert!(result.middleware_trace[1].success);
    assert!(!result.middleware_trace[2].success);
    assert_eq!(ctx.error.unwrap().code(), "PIPELINE_TIMEOUT");
}

// =============================================================================
// Built-in stages
// =============================================================================

#[tokio::test]
async fn test_default_pipeline_happy_path() {
    let events = EventSystem::new();
    let pipeline = MiddlewarePipeline::create_with_defaults(&PipelineConfig::default(), events.clone());
    assert_eq!(pipeline.middleware_names(), DEFAULT_STAGES);

    let mut ctx = context_with(authorized(), patients_request());
    let result = pipeline.execute_with_defaults(&mut ctx).await;

    assert!(result.success, "{:?}", ctx.error);
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.successful_middleware(), 5);
    assert_eq!(ctx.shared[stages::validation::VALIDATED_KEY], true);
    assert_eq!(ctx.shared[stages::permission::VERIFIED_KEY], true);

    let response = ctx.response.unwrap();
    assert_eq!(response.data["result"], json!([]));
    assert_eq!(response.processed_data.unwrap()["processed"], true);

    let completed = events.history(Some(types::PIPELINE_COMPLETED), None);
    assert_eq!(completed[0].get("middlewareCount"), Some(&json!(5)));
}

#[tokio::test]
async fn test_default_pipeline_without_token_aborts() {
    let pipeline = MiddlewarePipeline::create_with_defaults(&PipelineConfig::default(), EventSystem::new());

    let mut ctx = context_with(StaticCredentials::new(), patients_request());
    let result = pipeline.execute_with_defaults(&mut ctx).await;

    assert_eq!(result.status, ExecutionStatus::Failed);
    assert_eq!(result.middleware_trace.len(), 2);
    assert!(ctx.response.is_none());

    let err = ctx.error.unwrap();
    assert_eq!(err.category(), ErrorCategory::Permission);
    assert_eq!(err.context().resource.as_deref(), Some("patients"));
}

#[tokio::test]
async fn test_default_pipeline_continue_maps_errors() {
    let config = PipelineConfig {
        continue_on_error: true,
        ..PipelineConfig::default()
    };
    let pipeline = MiddlewarePipeline::create_with_defaults(&config, EventSystem::new());
    pipeline
        .register("flaky", failing("connection refused"), RegisterOptions::new().priority(60))
        .unwrap();

    let mut ctx = context_with(authorized(), patients_request());
    let result = pipeline.execute_with_defaults(&mut ctx).await;

    assert_eq!(result.status, ExecutionStatus::CompletedWithErrors);
    assert_eq!(result.middleware_trace.len(), 6);

    let err = ctx.error.unwrap();
    assert_eq!(err.category(), ErrorCategory::Network);
    assert!(err.message().contains("connection refused"));
}

#[tokio::test]
async fn test_invalid_request_stops_before_credentials() {
    let pipeline = MiddlewarePipeline::create_with_defaults(&PipelineConfig::default(), EventSystem::new());

    let mut ctx = context_with(authorized(), PipelineRequest::new("  ", "patients", "get"));
    let result = pipeline.execute_with_defaults(&mut ctx).await;

    assert_eq!(result.middleware_trace.len(), 1);
    assert_eq!(ctx.error.unwrap().category(), ErrorCategory::Validation);
    assert!(ctx.shared.get(stages::permission::VERIFIED_KEY).is_none());
}

#[tokio::test]
async fn test_disabled_default_stage_is_skipped() {
    let pipeline = MiddlewarePipeline::create_with_defaults(&PipelineConfig::default(), EventSystem::new());
    assert!(pipeline.set_enabled(stages::permission::NAME, false));

    let mut ctx = context_with(StaticCredentials::new(), patients_request());
    let result = pipeline.execute_with_defaults(&mut ctx).await;

    assert!(result.success);
    assert_eq!(result.middleware_trace.len(), 4);
}
