//! # Semble Middleware
//!
//! Priority-ordered async middleware pipeline for the Semble integration
//! layer.
//!
//! Unlike a fixed-order HTTP stack, stages are registered by name with a
//! numeric priority and may be disabled, removed or replaced at runtime. One
//! [`PipelineContext`] flows through every enabled stage of an execution.
//!
//! ## Built-in Stages
//!
//! ```text
//! request-validation(10) → permission-check(20) → api-execution(50)
//!     → response-processing(80) → error-mapping(90)
//! ```
//!
//! ## Example
//!
//! ```
//! use semble_config::PipelineConfig;
//! use semble_events::EventSystem;
//! use semble_middleware::{stages::DEFAULT_STAGES, MiddlewarePipeline};
//!
//! let pipeline = MiddlewarePipeline::create_with_defaults(
//!     &PipelineConfig::default(),
//!     EventSystem::new(),
//! );
//! assert_eq!(pipeline.middleware_names(), DEFAULT_STAGES);
//! ```

#![doc(html_root_url = "https://docs.rs/semble-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod stages;

pub use context::{
    Credentials, ExecutionHandle, PipelineContext, PipelineRequest, PipelineResponse,
    RequestMetadata, StaticCredentials,
};
pub use error::PipelineError;
pub use middleware::{BoxFuture, FnMiddleware, Middleware};
pub use pipeline::{
    BoxedMiddleware, ExecutionOptions, ExecutionStatus, MiddlewarePipeline, PipelineResult,
    RegisterOptions, TraceEntry,
};
