//! Pipeline context types.
//!
//! A [`PipelineContext`] is the single mutable value threaded through every
//! stage of one execution. Stages pass data forward only through
//! [`PipelineContext::shared`].

use crate::middleware::BoxFuture;
use semble_core::{ErrorContext, SembleError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Credentials returned by the host for a named credential type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    /// API token, if the credential carries one.
    pub token: Option<String>,
    /// Any other credential fields.
    pub extra: Map<String, Value>,
}

impl Credentials {
    /// Credentials consisting of just a token.
    pub fn token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            extra: Map::new(),
        }
    }

    /// Whether a non-empty token is present.
    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// The host side of an execution.
///
/// The pipeline never inspects the host beyond this trait.
pub trait ExecutionHandle: Send + Sync {
    /// Fetches the credentials stored under `name`.
    fn get_credentials<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Credentials, SembleError>>;
}

/// An [`ExecutionHandle`] backed by a fixed map of credentials.
///
/// # Example
///
/// ```
/// use semble_middleware::{Credentials, StaticCredentials};
///
/// let handle = StaticCredentials::new().with("sembleApi", Credentials::token("abc"));
/// assert!(handle.contains("sembleApi"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    credentials: HashMap<String, Credentials>,
}

impl StaticCredentials {
    /// Creates an empty credential store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds credentials under `name`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, credentials: Credentials) -> Self {
        self.credentials.insert(name.into(), credentials);
        self
    }

    /// Whether credentials exist under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.credentials.contains_key(name)
    }
}

impl ExecutionHandle for StaticCredentials {
    fn get_credentials<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Credentials, SembleError>> {
        Box::pin(async move {
            self.credentials.get(name).cloned().ok_or_else(|| {
                SembleError::new(format!("No credentials found for '{name}'"))
                    .with_code("CREDENTIALS_NOT_FOUND")
            })
        })
    }
}

/// Request metadata. `resource` and `action` are required by request
/// validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMetadata {
    /// Resource being accessed (e.g. `patients`).
    pub resource: Option<String>,
    /// Action being performed (e.g. `getMany`).
    pub action: Option<String>,
    /// Any other metadata.
    pub extra: Map<String, Value>,
}

/// The request a pipeline executes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineRequest {
    /// Query text.
    pub query: String,
    /// Query variables.
    pub variables: Map<String, Value>,
    /// Request metadata.
    pub metadata: RequestMetadata,
}

impl PipelineRequest {
    /// Creates a request for `resource`/`action`.
    pub fn new(query: impl Into<String>, resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Map::new(),
            metadata: RequestMetadata {
                resource: Some(resource.into()),
                action: Some(action.into()),
                extra: Map::new(),
            },
        }
    }

    /// Adds a query variable.
    #[must_use]
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }
}

/// The response produced during an execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineResponse {
    /// Raw response data.
    pub data: Value,
    /// Post-processed view of `data`.
    pub processed_data: Option<Value>,
    /// Response metadata. An `errors` array here holds upstream GraphQL errors.
    pub metadata: Map<String, Value>,
}

impl PipelineResponse {
    /// Creates a response around raw data.
    pub fn new(data: Value) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }
}

/// Mutable state of one pipeline execution.
pub struct PipelineContext {
    /// Host collaborator.
    pub execution: Arc<dyn ExecutionHandle>,
    /// The request.
    pub request: PipelineRequest,
    /// The response, once a stage has produced one.
    pub response: Option<PipelineResponse>,
    /// Inter-stage state.
    pub shared: Map<String, Value>,
    /// Terminal error of the execution.
    pub error: Option<SembleError>,
}

impl PipelineContext {
    /// Creates a context with no response, shared state or error.
    pub fn new(execution: Arc<dyn ExecutionHandle>, request: PipelineRequest) -> Self {
        Self {
            execution,
            request,
            response: None,
            shared: Map::new(),
            error: None,
        }
    }

    /// The requested resource, if any.
    pub fn resource(&self) -> Option<&str> {
        self.request.metadata.resource.as_deref()
    }

    /// The requested action, if any.
    pub fn action(&self) -> Option<&str> {
        self.request.metadata.action.as_deref()
    }

    /// Error context describing this request.
    pub fn error_context(&self) -> ErrorContext {
        let mut context = ErrorContext::new();
        context.operation = self.request.metadata.action.clone();
        context.resource = self.request.metadata.resource.clone();
        context
    }
}

impl fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineContext")
            .field("request", &self.request)
            .field("response", &self.response)
            .field("shared", &self.shared)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
