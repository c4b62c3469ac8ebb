//! Telemetry configuration.

use crate::logging::LogConfig;
use crate::metrics::MetricsConfig;
use semble_config::SembleConfig;

/// Configuration for all telemetry subsystems.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name (used in logs).
    pub service_name: String,

    /// Metrics configuration.
    pub metrics: MetricsConfig,

    /// Logging configuration.
    pub logging: LogConfig,
}

impl TelemetryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::new()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "semble-integration".to_string(),
            metrics: MetricsConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl From<&SembleConfig> for TelemetryConfig {
    fn from(config: &SembleConfig) -> Self {
        Self {
            service_name: config.logging.service_name.clone(),
            metrics: MetricsConfig::from(&config.metrics),
            logging: LogConfig::from(&config.logging),
        }
    }
}

/// Builder for [`TelemetryConfig`].
#[derive(Debug, Default)]
pub struct TelemetryConfigBuilder {
    service_name: Option<String>,
    metrics: Option<MetricsConfig>,
    logging: Option<LogConfig>,
}

impl TelemetryConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service name.
    #[must_use]
    pub fn service_name(mut self, name: &str) -> Self {
        self.service_name = Some(name.to_string());
        self
    }

    /// Sets the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, config: MetricsConfig) -> Self {
        self.metrics = Some(config);
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn logging(mut self, config: LogConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Enables metrics with the given duration buckets.
    #[must_use]
    pub fn metrics_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.metrics = Some(MetricsConfig {
            enabled: true,
            duration_buckets: buckets,
        });
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        let defaults = TelemetryConfig::default();

        let service_name = self.service_name.unwrap_or(defaults.service_name);

        let mut logging = self.logging.unwrap_or(defaults.logging);
        logging.service_name = service_name.clone();

        TelemetryConfig {
            service_name,
            metrics: self.metrics.unwrap_or(defaults.metrics),
            logging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "semble-integration");
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_builder_propagates_service_name() {
        let config = TelemetryConfig::builder()
            .service_name("clinic-sync")
            .logging(LogConfig::development())
            .build();

        assert_eq!(config.service_name, "clinic-sync");
        assert_eq!(config.logging.service_name, "clinic-sync");
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_builder_metrics_buckets() {
        let config = TelemetryConfig::builder()
            .metrics_buckets(vec![0.1, 1.0])
            .build();

        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.duration_buckets, vec![0.1, 1.0]);
    }

    #[test]
    fn test_from_semble_config() {
        let config = TelemetryConfig::from(&SembleConfig::production());
        assert!(config.metrics.enabled);
        assert!(config.logging.json_format);
        assert_eq!(config.service_name, "semble-integration");
    }
}
