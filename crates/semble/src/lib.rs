//! # Semble
//!
//! **Integration layer for the Semble practice-management GraphQL API**
//!
//! The host (a workflow node, a CLI, a service) supplies credentials and an
//! upstream client; this crate supplies everything in between:
//!
//! - **Typed errors** – one [`SembleError`](core::SembleError) with categories, severities and context
//! - **Error mapping** – GraphQL and HTTP error shapes turned into typed errors
//! - **Events** – prioritized pub/sub with history, `wait_for` and instrumentation
//! - **Service container** – named singleton, scoped and transient services
//! - **Schema registry** – versioned resource schemas and node property generation
//! - **Middleware pipeline** – priority-ordered async stages with a shared context
//!
//! ## Quick Start
//!
//! ```
//! use semble::prelude::*;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let layer = IntegrationLayer::builder().build().unwrap();
//!
//! let credentials = StaticCredentials::new().with("sembleApi", Credentials::token("token"));
//! let mut ctx = PipelineContext::new(
//!     Arc::new(credentials),
//!     PipelineRequest::new("query { patients { id } }", "patients", "getMany"),
//! );
//!
//! let result = layer.execute(&mut ctx).await;
//! assert!(result.success);
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SembleConfig ──► IntegrationLayer
//!                    ├── EventSystem ◄──── lifecycle events
//!                    ├── MiddlewarePipeline
//!                    │     validation → permission → execution → response → error-mapping
//!                    ├── SchemaRegistry
//!                    ├── ErrorMapper
//!                    └── Container (all of the above, by name)
//! ```

#![doc(html_root_url = "https://docs.rs/semble/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod layer;

pub use layer::{services, IntegrationError, IntegrationLayer, IntegrationLayerBuilder};

// Re-export the component crates
pub use semble_config as config;
pub use semble_core as core;
pub use semble_events as events;
pub use semble_middleware as middleware;
pub use semble_schema as schema;
pub use semble_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use semble::prelude::*;
///
/// let err = SembleError::new("boom");
/// assert_eq!(err.category(), ErrorCategory::Unknown);
/// ```
pub mod prelude {
    pub use crate::layer::{IntegrationLayer, IntegrationLayerBuilder};

    pub use semble_config::{ConfigLoader, SembleConfig};

    pub use semble_core::{
        Container, ErrorCategory, ErrorContext, ErrorMapper, ErrorSeverity, Lifetime, SembleError,
        SembleResult,
    };

    pub use semble_events::{Event, EventSystem, ListenerOptions};

    pub use semble_middleware::{
        Credentials, ExecutionHandle, ExecutionOptions, FnMiddleware, Middleware,
        MiddlewarePipeline, PipelineContext, PipelineRequest, PipelineResult, RegisterOptions,
        StaticCredentials,
    };

    pub use semble_schema::{ResourceSchema, SchemaRegistry};
}
