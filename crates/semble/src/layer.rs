//! The assembled integration layer.

use semble_config::{ConfigError, SembleConfig};
use semble_core::{Container, ContainerError, ErrorMapper};
use semble_events::EventSystem;
use semble_middleware::{MiddlewarePipeline, PipelineContext, PipelineResult};
use semble_schema::SchemaRegistry;
use semble_telemetry::{init_telemetry, TelemetryConfig, TelemetryError, TelemetryHandle};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Container names of the shared services.
pub mod services {
    /// [`SembleConfig`](semble_config::SembleConfig)
    pub const CONFIG: &str = "config";
    /// [`EventSystem`](semble_events::EventSystem)
    pub const EVENTS: &str = "eventSystem";
    /// [`MiddlewarePipeline`](semble_middleware::MiddlewarePipeline)
    pub const PIPELINE: &str = "middlewarePipeline";
    /// [`SchemaRegistry`](semble_schema::SchemaRegistry)
    pub const SCHEMAS: &str = "schemaRegistry";
    /// [`ErrorMapper`](semble_core::ErrorMapper)
    pub const ERROR_MAPPER: &str = "errorMapper";
}

/// Errors from [`IntegrationLayerBuilder::build`].
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Logging or metrics could not be installed.
    #[error("telemetry initialization failed: {0}")]
    Telemetry(#[from] TelemetryError),

    /// A shared service could not be registered.
    #[error("service registration failed: {0}")]
    Container(#[from] ContainerError),
}

/// The event system, pipeline, schema registry and service container wired
/// from one [`SembleConfig`].
///
/// Every shared service is also registered in the container as a singleton
/// under the names in [`services`], so host factories can depend on them.
pub struct IntegrationLayer {
    config: Arc<SembleConfig>,
    events: EventSystem,
    pipeline: Arc<MiddlewarePipeline>,
    schemas: Arc<SchemaRegistry>,
    mapper: Arc<ErrorMapper>,
    container: Container,
    telemetry: Option<TelemetryHandle>,
}

impl std::fmt::Debug for IntegrationLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrationLayer")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .field("services", &self.container.service_names())
            .finish_non_exhaustive()
    }
}

impl IntegrationLayer {
    /// Starts building a layer.
    pub fn builder() -> IntegrationLayerBuilder {
        IntegrationLayerBuilder::default()
    }

    /// The configuration the layer was built from.
    pub fn config(&self) -> &SembleConfig {
        &self.config
    }

    /// The shared event system.
    pub fn events(&self) -> &EventSystem {
        &self.events
    }

    /// The middleware pipeline.
    pub fn pipeline(&self) -> &Arc<MiddlewarePipeline> {
        &self.pipeline
    }

    /// The schema registry.
    pub fn schemas(&self) -> &Arc<SchemaRegistry> {
        &self.schemas
    }

    /// The error mapper.
    pub fn error_mapper(&self) -> &ErrorMapper {
        &self.mapper
    }

    /// The service container.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The service container, for registering host services.
    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    /// What telemetry installed, if it was requested.
    pub fn telemetry(&self) -> Option<&TelemetryHandle> {
        self.telemetry.as_ref()
    }

    /// Default timeout for [`EventSystem::wait_for`].
    pub fn wait_timeout(&self) -> Duration {
        self.events.wait_timeout()
    }

    /// Runs the pipeline with the configured default options.
    pub async fn execute(&self, ctx: &mut PipelineContext) -> PipelineResult {
        self.pipeline.execute_with_defaults(ctx).await
    }
}

/// Builder for [`IntegrationLayer`].
#[derive(Debug, Default)]
pub struct IntegrationLayerBuilder {
    config: Option<SembleConfig>,
    skip_default_stages: bool,
    telemetry: bool,
}

impl IntegrationLayerBuilder {
    /// Uses `config` instead of the defaults.
    #[must_use]
    pub fn config(mut self, config: SembleConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Starts with an empty pipeline instead of the built-in stages.
    #[must_use]
    pub fn without_default_stages(mut self) -> Self {
        self.skip_default_stages = true;
        self
    }

    /// Installs the global tracing subscriber and metrics recorder on build.
    #[must_use]
    pub fn with_telemetry(mut self) -> Self {
        self.telemetry = true;
        self
    }

    /// Validates the configuration and wires every component.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError::Config`] for an invalid configuration and
    /// [`IntegrationError::Telemetry`] if telemetry was requested but a
    /// global subscriber or recorder is already installed.
    pub fn build(self) -> Result<IntegrationLayer, IntegrationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let telemetry = if self.telemetry {
            Some(init_telemetry(TelemetryConfig::from(&config))?)
        } else {
            None
        };

        let events =
            EventSystem::with_limits(config.events.history_capacity, config.events.wait_timeout());
        let pipeline = Arc::new(if self.skip_default_stages {
            MiddlewarePipeline::from_config(&config.pipeline, events.clone())
        } else {
            MiddlewarePipeline::create_with_defaults(&config.pipeline, events.clone())
        });
        let schemas = Arc::new(SchemaRegistry::new());
        let mapper = Arc::new(ErrorMapper::new());
        let config = Arc::new(config);

        let mut container = Container::new();
        container.register_instance(services::CONFIG, Arc::clone(&config))?;
        container.register_instance(services::EVENTS, Arc::new(events.clone()))?;
        container.register_instance(services::PIPELINE, Arc::clone(&pipeline))?;
        container.register_instance(services::SCHEMAS, Arc::clone(&schemas))?;
        container.register_instance(services::ERROR_MAPPER, Arc::clone(&mapper))?;

        tracing::info!(
            stages = pipeline.len(),
            history_capacity = config.events.history_capacity,
            telemetry = telemetry.is_some(),
            "Integration layer ready"
        );

        Ok(IntegrationLayer {
            config,
            events,
            pipeline,
            schemas,
            mapper,
            container,
            telemetry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semble_config::PipelineConfig;
    use semble_middleware::stages::DEFAULT_STAGES;

    #[test]
    fn test_default_build() {
        let layer = IntegrationLayer::builder().build().unwrap();
        assert_eq!(layer.pipeline().middleware_names(), DEFAULT_STAGES);
        assert_eq!(layer.events().capacity(), layer.config().events.history_capacity);
        assert!(layer.telemetry().is_none());
        assert_eq!(layer.wait_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_without_default_stages() {
        let layer = IntegrationLayer::builder()
            .without_default_stages()
            .build()
            .unwrap();
        assert!(layer.pipeline().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SembleConfig::builder()
            .pipeline(PipelineConfig {
                timeout_ms: 0,
                ..PipelineConfig::default()
            })
            .build();
        let err = IntegrationLayer::builder().config(config).build().unwrap_err();
        assert!(matches!(err, IntegrationError::Config(_)));
    }

    #[test]
    fn test_services_resolvable() {
        let layer = IntegrationLayer::builder().build().unwrap();

        let pipeline: Arc<MiddlewarePipeline> = layer.container().resolve(services::PIPELINE).unwrap();
        assert!(Arc::ptr_eq(&pipeline, layer.pipeline()));

        let events: Arc<EventSystem> = layer.container().resolve(services::EVENTS).unwrap();
        assert_eq!(events.capacity(), layer.events().capacity());

        let config: Arc<SembleConfig> = layer.container().resolve(services::CONFIG).unwrap();
        assert_eq!(*config, *layer.config());
        assert!(layer.container().contains(services::ERROR_MAPPER));
    }
}
