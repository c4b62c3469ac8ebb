//! Observability for the Semble integration layer.
//!
//! - **Logging**: structured JSON or pretty output through `tracing-subscriber`
//! - **Metrics**: Prometheus text exposition through the `metrics` facade
//!
//! Nothing here is required: every component logs through `tracing` and
//! records through `metrics`, which stay silent until a subscriber or
//! recorder is installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use semble_config::SembleConfig;
//! use semble_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let handle = init_telemetry(TelemetryConfig::from(&SembleConfig::production()))?;
//! if let Some(text) = handle.render_metrics() {
//!     println!("{text}");
//! }
//! ```
//!
//! # Metrics Output
//!
//! ```text
//! # HELP semble_pipeline_executions_total Total number of pipeline executions by outcome
//! # TYPE semble_pipeline_executions_total counter
//! semble_pipeline_executions_total{status="completed"} 42
//! semble_pipeline_executions_total{status="failed"} 3
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use crate::metrics::{init_metrics, MetricsConfig, MetricsRegistry};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// What [`init_telemetry`] installed.
#[derive(Debug, Clone, Default)]
pub struct TelemetryHandle {
    metrics: Option<MetricsRegistry>,
}

impl TelemetryHandle {
    /// The metrics registry, when metrics are enabled.
    pub fn metrics(&self) -> Option<&MetricsRegistry> {
        self.metrics.as_ref()
    }

    /// Renders Prometheus text, when metrics are enabled.
    pub fn render_metrics(&self) -> Option<String> {
        self.metrics.as_ref().map(MetricsRegistry::render)
    }
}

/// Initializes logging and then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize,
/// including when a global subscriber or recorder already exists.
pub fn init_telemetry(config: TelemetryConfig) -> TelemetryResult<TelemetryHandle> {
    init_logging(&config.logging)?;
    let metrics = init_metrics(&config.metrics)?;
    Ok(TelemetryHandle { metrics })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_telemetry_installs_nothing() {
        let config = TelemetryConfig::builder()
            .logging(LogConfig {
                enabled: false,
                ..LogConfig::default()
            })
            .build();

        let handle = init_telemetry(config).unwrap();
        assert!(handle.metrics().is_none());
        assert!(handle.render_metrics().is_none());
    }
}
