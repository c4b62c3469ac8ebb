//! Prometheus metrics for the middleware pipeline.
//!
//! Recording goes through the `metrics` facade, so the functions here are
//! no-ops until a recorder is installed with [`init_metrics`].
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `semble_pipeline_executions_total` | Counter | `status` | Pipeline runs by outcome |
//! | `semble_pipeline_duration_seconds` | Histogram | - | Pipeline run latency |
//! | `semble_pipeline_stage_failures_total` | Counter | `stage` | Failed middleware stages |
//! | `semble_pipeline_in_flight` | Gauge | - | Pipelines currently executing |
//! | `semble_errors_mapped_total` | Counter | `category`, `code` | Errors produced by error mapping |

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Pipeline executions counter name.
pub const PIPELINE_EXECUTIONS: &str = "semble_pipeline_executions_total";
/// Pipeline duration histogram name.
pub const PIPELINE_DURATION: &str = "semble_pipeline_duration_seconds";
/// Stage failure counter name.
pub const STAGE_FAILURES: &str = "semble_pipeline_stage_failures_total";
/// In-flight pipelines gauge name.
pub const PIPELINES_IN_FLIGHT: &str = "semble_pipeline_in_flight";
/// Mapped errors counter name.
pub const ERRORS_MAPPED: &str = "semble_errors_mapped_total";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether to install a recorder.
    pub enabled: bool,

    /// Histogram buckets for pipeline duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self::from(&semble_config::MetricsConfig::default())
    }
}

impl From<&semble_config::MetricsConfig> for MetricsConfig {
    fn from(config: &semble_config::MetricsConfig) -> Self {
        Self {
            enabled: config.enabled,
            duration_buckets: config.histogram_buckets.clone(),
        }
    }
}

/// Handle to an installed Prometheus recorder.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Wraps a Prometheus handle.
    #[must_use]
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Renders all metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Builds a Prometheus exporter with the configured duration buckets.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidConfig` if the bucket list is empty.
pub fn prometheus_builder(config: &MetricsConfig) -> TelemetryResult<PrometheusBuilder> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(PIPELINE_DURATION.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::InvalidConfig(e.to_string()))
}

/// Installs the process-wide Prometheus recorder.
///
/// Returns `None` when metrics are disabled. No HTTP listener is started;
/// the host exposes [`MetricsRegistry::render`] however it likes.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<Option<MetricsRegistry>> {
    if !config.enabled {
        return Ok(None);
    }

    let handle = prometheus_builder(config)?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    register_metric_descriptions();

    Ok(Some(MetricsRegistry::new(handle)))
}

/// Registers descriptions for all standard metrics.
pub fn register_metric_descriptions() {
    describe_counter!(PIPELINE_EXECUTIONS, "Total number of pipeline executions by outcome");
    describe_histogram!(PIPELINE_DURATION, "Pipeline execution duration in seconds");
    describe_counter!(STAGE_FAILURES, "Total number of failed middleware stages");
    describe_gauge!(PIPELINES_IN_FLIGHT, "Number of pipelines currently executing");
    describe_counter!(ERRORS_MAPPED, "Total number of errors produced by error mapping");
}

/// Records a finished pipeline execution.
///
/// `status` is one of `completed`, `completed_with_errors` or `failed`.
pub fn record_pipeline_execution(status: &str, duration: Duration) {
    counter!(PIPELINE_EXECUTIONS, "status" => status.to_string()).increment(1);
    histogram!(PIPELINE_DURATION).record(duration.as_secs_f64());
}

/// Records a failed middleware stage.
pub fn record_stage_failure(stage: &str) {
    counter!(STAGE_FAILURES, "stage" => stage.to_string()).increment(1);
}

/// Records an error produced by error mapping.
pub fn record_error(category: &str, code: &str) {
    counter!(
        ERRORS_MAPPED,
        "category" => category.to_string(),
        "code" => code.to_string()
    )
    .increment(1);
}

/// Keeps the in-flight gauge raised until dropped.
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(PIPELINES_IN_FLIGHT).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(PIPELINES_IN_FLIGHT).decrement(1.0);
    }
}
