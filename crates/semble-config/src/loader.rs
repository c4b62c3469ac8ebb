//! Layered configuration loader.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! defaults, files and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, LogFormat, SembleConfig};

/// Prefix used by [`ConfigLoader::with_default_env`].
pub const DEFAULT_ENV_PREFIX: &str = "SEMBLE";

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (or a preset)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use semble_config::ConfigLoader;
///
/// # fn main() -> Result<(), semble_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("semble.toml")?
///     .with_dotenv()
///     .with_env_prefix("SEMBLE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: SembleConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader starting from [`SembleConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SembleConfig::default(),
            env_prefix: None,
        }
    }

    /// Start from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = SembleConfig::development();
        self
    }

    /// Start from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = SembleConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension (`.toml` or `.json`). Keys missing
    /// from the file take their default values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON or unknown keys
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.config = parse(&content, extension)?;
        tracing::debug!(path = %path.display(), "loaded configuration file");

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or `json`).
    ///
    /// # Example
    ///
    /// ```
    /// use semble_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [pipeline]
    ///     continue_on_error = true
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(config.pipeline.continue_on_error);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Read overrides from process environment variables on [`load`](Self::load).
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `SEMBLE__PIPELINE__TIMEOUT_MS=5000`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Same as `with_env_prefix("SEMBLE")`.
    #[must_use]
    pub fn with_default_env(self) -> Self {
        self.with_env_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Apply overrides from an explicit set of variables right away.
    ///
    /// Variables not starting with `prefix` are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use semble_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_env_vars("SEMBLE", [("SEMBLE__EVENTS__HISTORY_CAPACITY", "50")])
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.events.history_capacity, 50);
    /// ```
    pub fn with_env_vars<I, K, V>(mut self, prefix: &str, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let prefix = prefix.to_uppercase();
        let marker = format!("{prefix}__");
        for (key, value) in vars {
            let key = key.as_ref();
            if key.starts_with(&marker) {
                self.apply_env_var(key, value.as_ref(), &prefix)?;
            }
        }
        Ok(self)
    }

    /// Load a `.env` file into the process environment, if one exists.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        self
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable cannot be parsed or
    /// the final configuration fails validation.
    pub fn load(mut self) -> Result<SembleConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: Vec<(String, String)> = env::vars().collect();
            self = self.with_env_vars(&prefix, vars)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> SembleConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["PIPELINE", "CONTINUE_ON_ERROR"] => {
                config.pipeline.continue_on_error = parse_bool(key, value)?;
            }
            ["PIPELINE", "TIMEOUT_MS"] => {
                config.pipeline.timeout_ms = parse_number(key, value)?;
            }
            ["PIPELINE", "EMIT_EVENTS"] => {
                config.pipeline.emit_events = parse_bool(key, value)?;
            }
            ["PIPELINE", "DEFAULT_PRIORITY"] => {
                config.pipeline.default_priority = parse_number(key, value)?;
            }

            ["EVENTS", "HISTORY_CAPACITY"] => {
                config.events.history_capacity = parse_number(key, value)?;
            }
            ["EVENTS", "WAIT_TIMEOUT_MS"] => {
                config.events.wait_timeout_ms = parse_number(key, value)?;
            }

            ["LOGGING", "ENABLED"] => {
                config.logging.enabled = parse_bool(key, value)?;
            }
            ["LOGGING", "LEVEL"] => {
                config.logging.level = value.to_lowercase();
            }
            ["LOGGING", "FORMAT"] => {
                config.logging.format = LogFormat::parse(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected 'json' or 'pretty'"))?;
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                config.logging.include_location = parse_bool(key, value)?;
            }
            ["LOGGING", "SERVICE_NAME"] => {
                config.logging.service_name = value.to_string();
            }

            ["METRICS", "ENABLED"] => {
                config.metrics.enabled = parse_bool(key, value)?;
            }
            ["METRICS", "HISTOGRAM_BUCKETS"] => {
                config.metrics.histogram_buckets = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| parse_number(key, s))
                    .collect::<Result<Vec<f64>, _>>()?;
            }

            _ => {
                tracing::warn!(var = %key, "ignoring unknown configuration variable");
            }
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<SembleConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected number"))
}
