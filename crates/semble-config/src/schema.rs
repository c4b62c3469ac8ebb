//! Configuration section types.
//!
//! Every section rejects unknown keys and fills missing keys from its
//! `Default` implementation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Middleware pipeline section.
///
/// These values become the default `ExecutionOptions` of every pipeline
/// built from this configuration.
///
/// # Example
///
/// ```
/// use semble_config::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert!(!config.continue_on_error);
/// assert_eq!(config.timeout_ms, 30_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Record stage errors and keep going instead of aborting.
    #[serde(default)]
    pub continue_on_error: bool,

    /// Overall execution deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Publish lifecycle events on the event system.
    #[serde(default = "default_true")]
    pub emit_events: bool,

    /// Priority given to middleware registered without one.
    #[serde(default = "default_priority")]
    pub default_priority: i32,
}

impl PipelineConfig {
    /// The execution deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            timeout_ms: default_timeout_ms(),
            emit_events: true,
            default_priority: default_priority(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_priority() -> i32 {
    100
}

/// Event system section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EventsConfig {
    /// Maximum number of events kept in history.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Default `wait_for` timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub wait_timeout_ms: u64,
}

impl EventsConfig {
    /// The default `wait_for` timeout as a [`Duration`].
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            wait_timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_history_capacity() -> usize {
    1000
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines (production).
    #[default]
    Json,
    /// Human-readable output (development).
    Pretty,
}

impl LogFormat {
    /// Parses `json` or `pretty`, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,

    /// Service name attached to every log line.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
            service_name: default_service_name(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "semble-integration".to_string()
}

/// Metrics section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install a Prometheus recorder.
    #[serde(default)]
    pub enabled: bool,

    /// Histogram bucket boundaries for pipeline duration, in seconds.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            histogram_buckets: default_histogram_buckets(),
        }
    }
}

fn default_histogram_buckets() -> Vec<f64> {
    vec![
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ]
}

fn default_true() -> bool {
    true
}
