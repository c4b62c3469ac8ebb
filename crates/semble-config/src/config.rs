//! Root configuration type.
//!
//! This module provides [`SembleConfig`] and its builder.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, EventsConfig, LogFormat, LoggingConfig, MetricsConfig, PipelineConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete integration layer configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables over the defaults.
///
/// # Example
///
/// ```
/// use semble_config::SembleConfig;
///
/// let config = SembleConfig::default();
/// assert_eq!(config.events.history_capacity, 1000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct SembleConfig {
    /// Middleware pipeline defaults.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Event system settings.
    #[serde(default)]
    pub events: EventsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl SembleConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use semble_config::{PipelineConfig, SembleConfig};
    ///
    /// let config = SembleConfig::builder()
    ///     .pipeline(PipelineConfig {
    ///         continue_on_error: true,
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert!(config.pipeline.continue_on_error);
    /// ```
    #[must_use]
    pub fn builder() -> SembleConfigBuilder {
        SembleConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - A timeout or the history capacity is zero
    /// - The log level is not one of trace, debug, info, warn, error
    /// - Metrics are enabled with no histogram buckets
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "pipeline.timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.events.history_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "events.history_capacity",
                "must be greater than zero",
            ));
        }

        if self.events.wait_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "events.wait_timeout_ms",
                "must be greater than zero",
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown log level: {}", self.logging.level),
            ));
        }

        if self.metrics.enabled && self.metrics.histogram_buckets.is_empty() {
            return Err(ConfigError::invalid_value(
                "metrics.histogram_buckets",
                "at least one bucket is required when metrics are enabled",
            ));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs with source locations.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }

    /// Production preset: JSON info logs and metrics on.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.metrics.enabled = true;
        config
    }
}

/// Builder for [`SembleConfig`].
#[derive(Debug, Default)]
pub struct SembleConfigBuilder {
    pipeline: Option<PipelineConfig>,
    events: Option<EventsConfig>,
    logging: Option<LoggingConfig>,
    metrics: Option<MetricsConfig>,
}

impl SembleConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pipeline section.
    #[must_use]
    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Set the events section.
    #[must_use]
    pub fn events(mut self, events: EventsConfig) -> Self {
        self.events = Some(events);
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the metrics section.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> SembleConfig {
        SembleConfig {
            pipeline: self.pipeline.unwrap_or_default(),
            events: self.events.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    pub fn build_validated(self) -> Result<SembleConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SembleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.default_priority, 100);
        assert_eq!(config.logging.service_name, "semble-integration");
    }

    #[test]
    fn test_builder_all_sections() {
        let config = SembleConfig::builder()
            .pipeline(PipelineConfig {
                timeout_ms: 250,
                ..Default::default()
            })
            .events(EventsConfig {
                history_capacity: 10,
                ..Default::default()
            })
            .logging(LoggingConfig {
                level: "warn".to_string(),
                ..Default::default()
            })
            .metrics(MetricsConfig {
                enabled: true,
                ..Default::default()
            })
            .build();

        assert_eq!(config.pipeline.timeout_ms, 250);
        assert_eq!(config.events.history_capacity, 10);
        assert_eq!(config.logging.level, "warn");
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_validate_zero_timeout() {
        let result = SembleConfig::builder()
            .pipeline(PipelineConfig {
                timeout_ms: 0,
                ..Default::default()
            })
            .build_validated();
        assert!(result.unwrap_err().to_string().contains("pipeline.timeout_ms"));
    }

    #[test]
    fn test_validate_zero_capacity() {
        let result = SembleConfig::builder()
            .events(EventsConfig {
                history_capacity: 0,
                ..Default::default()
            })
            .build_validated();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("events.history_capacity"));
    }

    #[test]
    fn test_validate_unknown_level() {
        let result = SembleConfig::builder()
            .logging(LoggingConfig {
                level: "verbose".to_string(),
                ..Default::default()
            })
            .build_validated();
        assert!(result.unwrap_err().to_string().contains("verbose"));
    }

    #[test]
    fn test_validate_metrics_without_buckets() {
        let config = SembleConfig::builder()
            .metrics(MetricsConfig {
                enabled: true,
                histogram_buckets: Vec::new(),
            })
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_presets() {
        let dev = SembleConfig::development();
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert_eq!(dev.logging.level, "debug");

        let prod = SembleConfig::production();
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(prod.metrics.enabled);
        assert!(prod.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SembleConfig::development();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[pipeline]"));
        assert!(text.contains("[logging]"));

        let parsed: SembleConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let toml_str = r"
            [server]
            port = 8080
        ";
        let result: Result<SembleConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }
}
