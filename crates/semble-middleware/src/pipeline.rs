//! Priority-ordered middleware pipeline.
//!
//! Stages are kept sorted by ascending priority; ties keep registration
//! order. An execution snapshots the enabled stages and drives them one at a
//! time with an index cursor:
//!
//! ```text
//! started → stage[0] → stage[1] → … → completed | completed_with_errors
//!                 └── error, abort ──────────→ failed
//! ```
//!
//! A single deadline covers the whole execution. It is checked before each
//! stage starts; a stage already running is never interrupted.

use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::middleware::Middleware;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use semble_config::PipelineConfig;
use semble_core::{NetworkDetails, SembleError};
use semble_events::{types, Event, EventSystem};
use semble_telemetry::metrics::{record_pipeline_execution, record_stage_failure, InFlightGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source name on every event the pipeline emits.
pub const EVENT_SOURCE: &str = "middleware-pipeline";

/// Code of the error raised when the deadline passes.
pub const PIPELINE_TIMEOUT: &str = "PIPELINE_TIMEOUT";

/// A type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Options for [`MiddlewarePipeline::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Priority; lower runs earlier. `None` uses the pipeline default.
    pub priority: Option<i32>,
    /// Whether the stage takes part in executions.
    pub enabled: bool,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            priority: None,
            enabled: true,
        }
    }
}

impl RegisterOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the priority.
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Registers the stage disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Options for a single execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Record stage errors and keep going instead of aborting.
    pub continue_on_error: bool,
    /// Deadline for the whole execution.
    pub timeout: Duration,
    /// Publish lifecycle events.
    pub emit_events: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for ExecutionOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            continue_on_error: config.continue_on_error,
            timeout: config.timeout(),
            emit_events: config.emit_events,
        }
    }
}

impl ExecutionOptions {
    /// Sets `continue_on_error`.
    #[must_use]
    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets `emit_events`.
    #[must_use]
    pub fn emit_events(mut self, emit_events: bool) -> Self {
        self.emit_events = emit_events;
        self
    }
}

/// Final state of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Every stage succeeded.
    Completed,
    /// The chain ran to the end but recorded an error.
    CompletedWithErrors,
    /// A stage failed and the chain was aborted.
    Failed,
}

impl ExecutionStatus {
    /// Metric label and log value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing and outcome of one stage in one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    /// Stage name.
    pub name: String,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage ended.
    pub ended_at: DateTime<Utc>,
    /// Whether the stage succeeded.
    pub success: bool,
    /// Error message of a failed stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of [`MiddlewarePipeline::execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    /// `true` when the context holds no error afterwards.
    pub success: bool,
    /// Final state.
    pub status: ExecutionStatus,
    /// Wall-clock time of the execution.
    pub execution_time: Duration,
    /// One entry per stage that was started, in order.
    pub middleware_trace: Vec<TraceEntry>,
}

impl PipelineResult {
    /// Number of trace entries marked successful.
    pub fn successful_middleware(&self) -> usize {
        self.middleware_trace.iter().filter(|t| t.success).count()
    }
}

struct Registration {
    name: String,
    middleware: BoxedMiddleware,
    priority: i32,
    enabled: bool,
}

/// Ordered chain of async middleware.
///
/// # Example
///
/// ```
/// use semble_middleware::{
///     ExecutionOptions, FnMiddleware, MiddlewarePipeline, PipelineContext, PipelineRequest,
///     RegisterOptions, StaticCredentials,
/// };
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let pipeline = MiddlewarePipeline::new();
/// pipeline
///     .register("stamp", FnMiddleware::new(|ctx| {
///         ctx.shared.insert("stamped".to_string(), true.into());
///         Ok(())
///     }), RegisterOptions::new().priority(10))
///     .unwrap();
///
/// let mut ctx = PipelineContext::new(
///     Arc::new(StaticCredentials::new()),
///     PipelineRequest::new("query { patients { id } }", "patients", "getMany"),
/// );
/// let result = pipeline.execute(&mut ctx, ExecutionOptions::default()).await;
/// assert!(result.success);
/// assert_eq!(ctx.shared["stamped"], true);
/// # });
/// ```
pub struct MiddlewarePipeline {
    registrations: RwLock<Vec<Registration>>,
    events: EventSystem,
    default_priority: i32,
    defaults: ExecutionOptions,
}

impl Default for MiddlewarePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewarePipeline")
            .field("middleware", &self.middleware_names())
            .field("default_priority", &self.default_priority)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl MiddlewarePipeline {
    /// Creates an empty pipeline with its own event system.
    pub fn new() -> Self {
        Self::with_event_system(EventSystem::new())
    }

    /// Creates an empty pipeline publishing to `events`.
    pub fn with_event_system(events: EventSystem) -> Self {
        Self::from_config(&PipelineConfig::default(), events)
    }

    /// Creates an empty pipeline whose defaults come from `config`.
    pub fn from_config(config: &PipelineConfig, events: EventSystem) -> Self {
        Self {
            registrations: RwLock::new(Vec::new()),
            events,
            default_priority: config.default_priority,
            defaults: ExecutionOptions::from(config),
        }
    }

    /// Creates a pipeline with the five built-in stages registered.
    pub fn create_with_defaults(config: &PipelineConfig, events: EventSystem) -> Self {
        let pipeline = Self::from_config(config, events);
        crate::stages::register_defaults(&pipeline);
        pipeline
    }

    /// The event system lifecycle events go to.
    pub fn events(&self) -> &EventSystem {
        &self.events
    }

    /// The options [`execute_with_defaults`](Self::execute_with_defaults) uses.
    pub fn default_options(&self) -> ExecutionOptions {
        self.defaults
    }

    /// Adds a stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DuplicateMiddleware`] if the name is taken;
    /// the existing stage is left untouched.
    pub fn register(
        &self,
        name: impl Into<String>,
        middleware: impl Middleware,
        options: RegisterOptions,
    ) -> Result<(), PipelineError> {
        self.register_boxed(name, Arc::new(middleware), options)
    }

    /// Adds an already shared stage.
    pub fn register_boxed(
        &self,
        name: impl Into<String>,
        middleware: BoxedMiddleware,
        options: RegisterOptions,
    ) -> Result<(), PipelineError> {
        let name = name.into();
        let priority = options.priority.unwrap_or(self.default_priority);
        {
            let mut registrations = self.registrations.write();
            if registrations.iter().any(|r| r.name == name) {
                return Err(PipelineError::DuplicateMiddleware { name });
            }
            registrations.push(Registration {
                name: name.clone(),
                middleware,
                priority,
                enabled: options.enabled,
            });
            registrations.sort_by_key(|r| r.priority);
        }

        tracing::debug!(
            pipeline.middleware = %name,
            priority,
            enabled = options.enabled,
            "Middleware registered"
        );
        self.events.notify(
            Event::new(types::MIDDLEWARE_REGISTERED, EVENT_SOURCE)
                .with_payload("name", name)
                .with_payload("priority", priority)
                .with_payload("enabled", options.enabled),
        );
        Ok(())
    }

    /// Removes a stage. Returns `false` if the name is unknown.
    pub fn unregister(&self, name: &str) -> bool {
        let mut registrations = self.registrations.write();
        let before = registrations.len();
        registrations.retain(|r| r.name != name);
        registrations.len() != before
    }

    /// Enables or disables a stage. Returns `false` if the name is unknown.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut registrations = self.registrations.write();
        match registrations.iter_mut().find(|r| r.name == name) {
            Some(registration) => {
                registration.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Whether a stage is registered and enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.registrations
            .read()
            .iter()
            .any(|r| r.name == name && r.enabled)
    }

    /// Stage names in execution order, disabled stages included.
    pub fn middleware_names(&self) -> Vec<String> {
        self.registrations
            .read()
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    /// Number of registered stages.
    pub fn len(&self) -> usize {
        self.registrations.read().len()
    }

    /// Whether no stage is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.read().is_empty()
    }

    /// Executes with the pipeline's configured default options.
    pub async fn execute_with_defaults(&self, ctx: &mut PipelineContext) -> PipelineResult {
        self.execute(ctx, self.defaults).await
    }

    /// Runs every enabled stage against `ctx` in priority order.
    ///
    /// A stage error either aborts the chain (the default) or, with
    /// `continue_on_error`, is stored in `ctx.error` and the next stage runs.
    /// Either way the failing stage gets a trace entry with `success: false`.
    pub async fn execute(&self, ctx: &mut PipelineContext, options: ExecutionOptions) -> PipelineResult {
        let chain: Vec<(String, BoxedMiddleware)> = self
            .registrations
            .read()
            .iter()
            .filter(|r| r.enabled)
            .map(|r| (r.name.clone(), Arc::clone(&r.middleware)))
            .collect();

        let _in_flight = InFlightGuard::new();
        let started = Instant::now();
        let deadline = started.checked_add(options.timeout);

        if options.emit_events {
            self.events
                .emit(
                    Event::new(types::PIPELINE_STARTED, EVENT_SOURCE)
                        .with_payload("middlewareCount", chain.len())
                        .with_payload("resource", ctx.resource().unwrap_or_default())
                        .with_payload("action", ctx.action().unwrap_or_default()),
                )
                .await;
        }

        let mut trace = Vec::with_capacity(chain.len());
        let mut aborted = None;
        let mut cursor = 0;

        while cursor < chain.len() {
            let (name, middleware) = &chain[cursor];
            cursor += 1;

            let started_at = Utc::now();
            let outcome = if deadline.is_some_and(|d| Instant::now() >= d) {
                Err(timeout_error(options.timeout))
            } else {
                middleware.process(ctx).await
            };
            let ended_at = Utc::now();

            let Err(err) = outcome else {
                trace.push(TraceEntry {
                    name: name.clone(),
                    started_at,
                    ended_at,
                    success: true,
                    error: None,
                });
                continue;
            };

            trace.push(TraceEntry {
                name: name.clone(),
                started_at,
                ended_at,
                success: false,
                error: Some(err.message().to_string()),
            });
            record_stage_failure(name);
            tracing::warn!(
                pipeline.middleware = %name,
                error.code = %err.code(),
                error.category = %err.category(),
                "Middleware failed: {}",
                err.message()
            );

            let err = attach_context(err, ctx);
            if options.continue_on_error {
                if options.emit_events {
                    self.events
                        .emit(
                            Event::new(types::MIDDLEWARE_ERROR, EVENT_SOURCE)
                                .with_payload("middleware", name.as_str())
                                .with_payload("error", err.message())
                                .with_payload("code", err.code()),
                        )
                        .await;
                }
                ctx.error = Some(err);
            } else {
                aborted = Some((name.clone(), err));
                break;
            }
        }

        let execution_time = started.elapsed();
        let execution_ms = u64::try_from(execution_time.as_millis()).unwrap_or(u64::MAX);
        let successful = trace.iter().filter(|t| t.success).count();

        let status = if let Some((stage, err)) = aborted {
            if options.emit_events {
                self.events
                    .emit(
                        Event::new(types::PIPELINE_FAILED, EVENT_SOURCE)
                            .with_payload("middleware", stage)
                            .with_payload("error", err.message())
                            .with_payload("code", err.code())
                            .with_payload("executionTime", execution_ms),
                    )
                    .await;
            }
            ctx.error = Some(err);
            ExecutionStatus::Failed
        } else {
            let status = if ctx.error.is_some() {
                ExecutionStatus::CompletedWithErrors
            } else {
                ExecutionStatus::Completed
            };
            if options.emit_events {
                let event_type = match status {
                    ExecutionStatus::Completed => types::PIPELINE_COMPLETED,
                    _ => types::PIPELINE_COMPLETED_WITH_ERRORS,
                };
                self.events
                    .emit(
                        Event::new(event_type, EVENT_SOURCE)
                            .with_payload("executionTime", execution_ms)
                            .with_payload("middlewareCount", chain.len())
                            .with_payload("successfulMiddleware", successful),
                    )
                    .await;
            }
            status
        };

        record_pipeline_execution(status.as_str(), execution_time);
        tracing::info!(
            pipeline.status = %status,
            duration_ms = execution_ms,
            stages = chain.len(),
            successful,
            "Pipeline execution finished"
        );

        PipelineResult {
            success: ctx.error.is_none(),
            status,
            execution_time,
            middleware_trace: trace,
        }
    }
}

fn timeout_error(timeout: Duration) -> SembleError {
    SembleError::network(
        format!("Pipeline execution timed out after {}ms", timeout.as_millis()),
        NetworkDetails {
            url: None,
            timeout: Some(timeout),
        },
    )
    .with_code(PIPELINE_TIMEOUT)
}

fn attach_context(err: SembleError, ctx: &PipelineContext) -> SembleError {
    if err.context().is_empty() {
        err.with_context(ctx.error_context())
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{PipelineRequest, StaticCredentials};
    use crate::middleware::{BoxFuture, FnMiddleware};
    use parking_lot::Mutex;
    use semble_core::ErrorCategory;

    fn context() -> PipelineContext {
        PipelineContext::new(
            Arc::new(StaticCredentials::new()),
            PipelineRequest::new("query { patients { id } }", "patients", "getMany"),
        )
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> impl Middleware {
        let log = Arc::clone(log);
        FnMiddleware::new(move |_| {
            log.lock().push(name.to_string());
            Ok(())
        })
    }

    fn failing(message: &'static str) -> impl Middleware {
        FnMiddleware::new(move |_| Err(SembleError::new(message)))
    }

    struct Sleeper(Duration);

    impl Middleware for Sleeper {
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

    #[test]
    fn test_register_orders_by_priority() {
        let pipeline = MiddlewarePipeline::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        pipeline.register("c", recorder(&log, "c"), RegisterOptions::new()).unwrap();
        pipeline
            .register("a", recorder(&log, "a"), RegisterOptions::new().priority(10))
            .unwrap();
        pipeline
            .register("b", recorder(&log, "b"), RegisterOptions::new().priority(50))
            .unwrap();
        pipeline
            .register("b2", recorder(&log, "b2"), RegisterOptions::new().priority(50))
            .unwrap();

        assert_eq!(pipeline.middleware_names(), ["a", "b", "b2", "c"]);
        assert_eq!(pipeline.len(), 4);
    }

    #[tokio::test]
    async fn test_duplicate_registration_keeps_original() {
        let pipeline = MiddlewarePipeline::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        pipeline
            .register("audit", recorder(&log, "first"), RegisterOptions::new().priority(5))
            .unwrap();

        let err = pipeline
            .register("audit", recorder(&log, "second"), RegisterOptions::new().priority(1).disabled())
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::DuplicateMiddleware {
                name: "audit".to_string()
            }
        );
        assert!(pipeline.is_enabled("audit"));
        assert_eq!(pipeline.len(), 1);

        let result = pipeline.execute(&mut context(), ExecutionOptions::default()).await;
        assert!(result.success);
        assert_eq!(*log.lock(), ["first"]);
        assert_eq!(result.middleware_trace[0].name, "audit");
    }

    #[test]
    fn test_unregister_and_set_enabled_unknown() {
        let pipeline = MiddlewarePipeline::new();
        assert!(!pipeline.unregister("missing"));
        assert!(!pipeline.set_enabled("missing", true));

        pipeline.register("x", failing("x"), RegisterOptions::new()).unwrap();
        assert!(pipeline.set_enabled("x", false));
        assert!(!pipeline.is_enabled("x"));
        assert!(pipeline.unregister("x"));
        assert!(pipeline.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_stage_is_skipped() {
        let pipeline = MiddlewarePipeline::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        pipeline.register("on", recorder(&log, "on"), RegisterOptions::new()).unwrap();
        pipeline
            .register("off", recorder(&log, "off"), RegisterOptions::new().disabled())
            .unwrap();

        let result = pipeline.execute(&mut context(), ExecutionOptions::default()).await;
        assert!(result.success);
        assert_eq!(*log.lock(), ["on"]);
        assert_eq!(result.middleware_trace.len(), 1);
    }

    #[tokio::test]
    async fn test_abort_stops_chain() {
        let pipeline = MiddlewarePipeline::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        pipeline
            .register("one", recorder(&log, "one"), RegisterOptions::new().priority(1))
            .unwrap();
        pipeline
            .register("two", failing("connection refused"), RegisterOptions::new().priority(2))
            .unwrap();
        pipeline
            .register("three", recorder(&log, "three"), RegisterOptions::new().priority(3))
            .unwrap();

        let mut ctx = context();
        let result = pipeline.execute(&mut ctx, ExecutionOptions::default()).await;

        assert!(!result.success);
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.middleware_trace.len(), 2);
        assert!(!result.middleware_trace[1].success);
        assert_eq!(*log.lock(), ["one"]);

        let err = ctx.error.unwrap();
        assert_eq!(err.message(), "connection refused");
        assert_eq!(err.context().resource.as_deref(), Some("patients"));
    }

    #[tokio::test]
    async fn test_continue_runs_remaining_stages() {
        let pipeline = MiddlewarePipeline::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        pipeline
            .register("one", failing("bad input"), RegisterOptions::new().priority(1))
            .unwrap();
        pipeline
            .register("two", recorder(&log, "two"), RegisterOptions::new().priority(2))
            .unwrap();

        let mut ctx = context();
        let result = pipeline
            .execute(&mut ctx, ExecutionOptions::default().continue_on_error(true))
            .await;

        assert!(!result.success);
        assert_eq!(result.status, ExecutionStatus::CompletedWithErrors);
        assert_eq!(result.middleware_trace.len(), 2);
        assert!(!result.middleware_trace[0].success);
        assert!(result.middleware_trace[1].success);
        assert_eq!(result.successful_middleware(), 1);
        assert_eq!(*log.lock(), ["two"]);
    }

    #[tokio::test]
    async fn test_empty_pipeline_succeeds() {
        let pipeline = MiddlewarePipeline::new();
        let result = pipeline.execute(&mut context(), ExecutionOptions::default()).await;
        assert!(result.success);
        assert_eq!(result.status, ExecutionStatus::Completed);
        assert!(result.middleware_trace.is_empty());
    }

    #[tokio::test]
    async fn test_deadline_fails_next_stage() {
        let pipeline = MiddlewarePipeline::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        pipeline
            .register("slow", Sleeper(Duration::from_millis(100)), RegisterOptions::new().priority(1))
            .unwrap();
        pipeline
            .register("after", recorder(&log, "after"), RegisterOptions::new().priority(2))
            .unwrap();

        let mut ctx = context();
        let result = pipeline
            .execute(&mut ctx, ExecutionOptions::default().timeout(Duration::from_millis(50)))
            .await;

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(result.middleware_trace[0].success);
        assert!(!result.middleware_trace[1].success);
        assert!(log.lock().is_empty());

        let err = ctx.error.unwrap();
        assert_eq!(err.code(), PIPELINE_TIMEOUT);
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let events = EventSystem::new();
        let pipeline = MiddlewarePipeline::with_event_system(events.clone());
        pipeline
            .register("bad", failing("boom"), RegisterOptions::new())
            .unwrap();

        pipeline
            .execute(&mut context(), ExecutionOptions::default().continue_on_error(true))
            .await;

        let seen: Vec<String> = events
            .history(None, None)
            .into_iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(
            seen,
            [
                types::MIDDLEWARE_REGISTERED,
                types::PIPELINE_STARTED,
                types::MIDDLEWARE_ERROR,
                types::PIPELINE_COMPLETED_WITH_ERRORS,
            ]
        );

        let completed = events
            .history(Some(types::PIPELINE_COMPLETED_WITH_ERRORS), None)
            .pop()
            .unwrap();
        assert_eq!(completed.get("middlewareCount"), Some(&1.into()));
        assert_eq!(completed.get("successfulMiddleware"), Some(&0.into()));
    }

    #[tokio::test]
    async fn test_events_suppressed() {
        let events = EventSystem::new();
        let pipeline = MiddlewarePipeline::with_event_system(events.clone());
        pipeline
            .execute(&mut context(), ExecutionOptions::default().emit_events(false))
            .await;
        assert!(events.history(None, None).is_empty());
    }

    #[test]
    fn test_options_from_config() {
        let config = PipelineConfig {
            continue_on_error: true,
            timeout_ms: 1500,
            emit_events: false,
            default_priority: 7,
        };
        let options = ExecutionOptions::from(&config);
        assert!(options.continue_on_error);
        assert_eq!(options.timeout, Duration::from_millis(1500));
        assert!(!options.emit_events);

        let pipeline = MiddlewarePipeline::from_config(&config, EventSystem::new());
        pipeline.register("x", failing("x"), RegisterOptions::new()).unwrap();
        assert_eq!(pipeline.default_options(), options);
        assert_eq!(pipeline.registrations.read()[0].priority, 7);
    }

    #[test]
    fn test_trace_entry_json_shape() {
        let entry = TraceEntry {
            name: "request-validation".to_string(),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            success: true,
            error: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("startedAt").is_some());
        assert!(value.get("error").is_none());
        assert_eq!(serde_json::to_value(ExecutionStatus::CompletedWithErrors).unwrap(), "completed_with_errors");
    }
}
