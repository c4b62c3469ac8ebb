//! Typed configuration for the Semble integration layer.
//!
//! This crate provides a strongly-typed configuration with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! [`SembleConfig`] holds one section per component:
//!
//! - [`PipelineConfig`] - middleware pipeline defaults
//! - [`EventsConfig`] - event history and `wait_for` timeout
//! - [`LoggingConfig`] - log level and format
//! - [`MetricsConfig`] - Prometheus recorder settings
//!
//! # Example
//!
//! ```no_run
//! use semble_config::ConfigLoader;
//!
//! # fn main() -> Result<(), semble_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_file("semble.toml")?
//!     .with_env_prefix("SEMBLE")
//!     .load()?;
//!
//! println!("pipeline deadline: {:?}", config.pipeline.timeout());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [pipeline]
//! continue_on_error = false
//! timeout_ms = 30000
//! emit_events = true
//! default_priority = 100
//!
//! [events]
//! history_capacity = 1000
//! wait_timeout_ms = 30000
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = false
//! ```
//!
//! # Environment Variable Overrides
//!
//! Every key can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `SEMBLE__PIPELINE__CONTINUE_ON_ERROR=true`
//! - `SEMBLE__EVENTS__HISTORY_CAPACITY=500`
//! - `SEMBLE__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{SembleConfig, SembleConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{EventsConfig, LogFormat, LoggingConfig, MetricsConfig, PipelineConfig};
