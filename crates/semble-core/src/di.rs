//! Dependency injection container.
//!
//! Services are registered by name with a factory, a [`Lifetime`] and the
//! names of the services the factory needs. Resolving a service first
//! resolves its declared dependencies and hands them to the factory as a
//! [`Dependencies`] view.
//!
//! | Lifetime | Cached |
//! |---|---|
//! | [`Lifetime::Singleton`] | once per container |
//! | [`Lifetime::Scoped`] | once per (scope, service) |
//! | [`Lifetime::Transient`] | never |
//!
//! Cycles are detected while resolving, not at registration time.
//!
//! # Example
//!
//! ```rust
//! use semble_core::di::{Container, Lifetime};
//! use std::sync::Arc;
//!
//! struct Token(String);
//! struct Client {
//!     token: Arc<Token>,
//! }
//!
//! let mut container = Container::new();
//! container
//!     .register("token", |_| Ok(Token("secret".to_string())), Lifetime::Singleton, &[])
//!     .unwrap();
//! container
//!     .register(
//!         "client",
//!         |deps| Ok(Client { token: deps.get::<Token>("token")? }),
//!         Lifetime::Transient,
//!         &["token"],
//!     )
//!     .unwrap();
//!
//! let client: Arc<Client> = container.resolve("client").unwrap();
//! assert_eq!(client.token.0, "secret");
//! ```

use crate::error::{ConfigDetails, SembleError};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Scope used when none is given.
pub const DEFAULT_SCOPE: &str = "default";

/// A type-erased service instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

type Factory = Arc<dyn Fn(&Dependencies) -> Result<Instance, ContainerError> + Send + Sync>;

/// How long a resolved instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// Built once and cached for the container's lifetime.
    #[default]
    Singleton,
    /// Built on every resolution.
    Transient,
    /// Built once per named scope.
    Scoped,
}

/// Errors raised by the [`Container`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// A service with this name already exists.
    #[error("service '{name}' is already registered")]
    AlreadyRegistered {
        /// Service name.
        name: String,
    },

    /// No service with this name exists.
    #[error("service '{name}' is not registered")]
    NotRegistered {
        /// Service name.
        name: String,
    },

    /// Resolution came back to a service already being resolved.
    #[error("circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency {
        /// Resolution path, ending with the repeated service.
        cycle: Vec<String>,
    },

    /// The instance is not of the requested type.
    #[error("service '{name}' is not of type {expected}")]
    TypeMismatch {
        /// Service name.
        name: String,
        /// Requested type.
        expected: &'static str,
    },

    /// A factory reported a failure.
    #[error("factory for service '{name}' failed: {reason}")]
    Factory {
        /// Service name.
        name: String,
        /// Failure description.
        reason: String,
    },
}

impl ContainerError {
    /// Creates a factory failure.
    pub fn factory(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Factory {
            name: name.into(),
            reason: reason.into(),
        }
    }

    fn service_name(&self) -> Option<&str> {
        match self {
            Self::AlreadyRegistered { name }
            | Self::NotRegistered { name }
            | Self::TypeMismatch { name, .. }
            | Self::Factory { name, .. } => Some(name),
            Self::CircularDependency { .. } => None,
        }
    }
}

impl From<ContainerError> for SembleError {
    fn from(err: ContainerError) -> Self {
        let details = ConfigDetails {
            config_key: err.service_name().map(ToString::to_string),
            ..ConfigDetails::default()
        };
        SembleError::configuration(err.to_string(), details)
            .with_code("CONTAINER_ERROR")
            .with_cause(err)
    }
}

/// Already-resolved dependencies handed to a factory.
#[derive(Default)]
pub struct Dependencies {
    resolved: HashMap<String, Instance>,
}

impl Dependencies {
    /// Returns a resolved dependency as `T`.
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ContainerError> {
        let instance = self
            .resolved
            .get(name)
            .cloned()
            .ok_or_else(|| ContainerError::NotRegistered {
                name: name.to_string(),
            })?;
        downcast(name, instance)
    }

    /// Returns the raw instance of a dependency.
    #[must_use]
    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.resolved.get(name)
    }

    /// Returns the number of dependencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    /// Returns `true` if there are no dependencies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("names", &self.resolved.keys().collect::<Vec<_>>())
            .finish()
    }
}

struct Registration {
    factory: Factory,
    lifetime: Lifetime,
    dependencies: Vec<String>,
}

/// A dependency injection container.
///
/// Registration and [`clear`](Container::clear) need `&mut self`; resolution
/// works through `&self`, caches are guarded internally.
#[derive(Default)]
pub struct Container {
    registrations: HashMap<String, Registration>,
    singletons: Mutex<HashMap<String, Instance>>,
    scoped: Mutex<HashMap<String, HashMap<String, Instance>>>,
}

impl Container {
    /// Creates a new empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::AlreadyRegistered`] if `name` is taken.
    pub fn register<T, F>(
        &mut self,
        name: impl Into<String>,
        factory: F,
        lifetime: Lifetime,
        dependencies: &[&str],
    ) -> Result<(), ContainerError>
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.registrations.contains_key(&name) {
            return Err(ContainerError::AlreadyRegistered { name });
        }

        let factory: Factory = Arc::new(move |deps| factory(deps).map(|v| Arc::new(v) as Instance));
        tracing::debug!(service = %name, ?lifetime, ?dependencies, "service registered");
        self.registrations.insert(
            name,
            Registration {
                factory,
                lifetime,
                dependencies: dependencies.iter().map(ToString::to_string).collect(),
            },
        );
        Ok(())
    }

    /// Registers an already built value as a singleton.
    pub fn register_instance<T: Send + Sync + 'static>(
        &mut self,
        name: impl Into<String>,
        value: Arc<T>,
    ) -> Result<(), ContainerError> {
        let name = name.into();
        if self.registrations.contains_key(&name) {
            return Err(ContainerError::AlreadyRegistered { name });
        }
        let instance: Instance = value;
        let cached = Arc::clone(&instance);
        self.singletons.lock().insert(name.clone(), cached);
        let factory: Factory = Arc::new(move |_| Ok(Arc::clone(&instance)));
        self.registrations.insert(
            name,
            Registration {
                factory,
                lifetime: Lifetime::Singleton,
                dependencies: Vec::new(),
            },
        );
        Ok(())
    }

    /// Resolves a service in the default scope.
    pub fn resolve<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ContainerError> {
        self.resolve_in_scope(name, DEFAULT_SCOPE)
    }

    /// Resolves a service in a named scope.
    pub fn resolve_in_scope<T: Send + Sync + 'static>(
        &self,
        name: &str,
        scope: &str,
    ) -> Result<Arc<T>, ContainerError> {
        let instance = self.resolve_instance(name, Some(scope))?;
        downcast(name, instance)
    }

    /// Resolves a service without downcasting it.
    pub fn resolve_instance(&self, name: &str, scope: Option<&str>) -> Result<Instance, ContainerError> {
        let mut stack = Vec::new();
        self.resolve_with_stack(name, scope.unwrap_or(DEFAULT_SCOPE), &mut stack)
    }

    fn resolve_with_stack(
        &self,
        name: &str,
        scope: &str,
        stack: &mut Vec<String>,
    ) -> Result<Instance, ContainerError> {
        if stack.iter().any(|entry| entry == name) {
            let mut cycle = stack.clone();
            cycle.push(name.to_string());
            return Err(ContainerError::CircularDependency { cycle });
        }

        let registration = self
            .registrations
            .get(name)
            .ok_or_else(|| ContainerError::NotRegistered {
                name: name.to_string(),
            })?;

        stack.push(name.to_string());
        let result = self.instantiate(name, registration, scope, stack);
        stack.pop();
        result
    }

    fn instantiate(
        &self,
        name: &str,
        registration: &Registration,
        scope: &str,
        stack: &mut Vec<String>,
    ) -> Result<Instance, ContainerError> {
        match registration.lifetime {
            Lifetime::Singleton => {
                let cached = self.singletons.lock().get(name).cloned();
                if let Some(instance) = cached {
                    return Ok(instance);
                }
                let built = self.build(registration, scope, stack)?;
                Ok(Arc::clone(
                    self.singletons
                        .lock()
                        .entry(name.to_string())
                        .or_insert(built),
                ))
            }
            Lifetime::Scoped => {
                let cached = self
                    .scoped
                    .lock()
                    .get(scope)
                    .and_then(|instances| instances.get(name))
                    .cloned();
                if let Some(instance) = cached {
                    return Ok(instance);
                }
                let built = self.build(registration, scope, stack)?;
                Ok(Arc::clone(
                    self.scoped
                        .lock()
                        .entry(scope.to_string())
                        .or_default()
                        .entry(name.to_string())
                        .or_insert(built),
                ))
            }
            Lifetime::Transient => self.build(registration, scope, stack),
        }
    }

    fn build(
        &self,
        registration: &Registration,
        scope: &str,
        stack: &mut Vec<String>,
    ) -> Result<Instance, ContainerError> {
        let mut deps = Dependencies::default();
        for dependency in &registration.dependencies {
            let instance = self.resolve_with_stack(dependency, scope, stack)?;
            deps.resolved.insert(dependency.clone(), instance);
        }
        (registration.factory)(&deps)
    }

    /// Returns a facade resolving into the named scope.
    #[must_use]
    pub fn create_scope(&self, name: impl Into<String>) -> ScopedContainer<'_> {
        ScopedContainer {
            container: self,
            name: name.into(),
        }
    }

    /// Drops the cached instances of one scope.
    pub fn clear_scope(&self, scope: &str) {
        if self.scoped.lock().remove(scope).is_some() {
            tracing::debug!(scope, "scope cleared");
        }
    }

    /// Removes every registration and cached instance.
    pub fn clear(&mut self) {
        self.registrations.clear();
        self.singletons.lock().clear();
        self.scoped.lock().clear();
    }

    /// Checks if a service is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.registrations.contains_key(name)
    }

    /// Returns the registered service names, sorted.
    #[must_use]
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.registrations.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.registrations.len())
            .field("singleton_count", &self.singletons.lock().len())
            .field("scope_count", &self.scoped.lock().len())
            .finish()
    }
}

/// A view of a [`Container`] bound to one scope.
#[derive(Debug)]
pub struct ScopedContainer<'a> {
    container: &'a Container,
    name: String,
}

impl ScopedContainer<'_> {
    /// Returns the scope name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves a service into this scope.
    pub fn resolve<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ContainerError> {
        self.container.resolve_in_scope(name, &self.name)
    }

    /// Drops this scope's cached instances only.
    pub fn clear(&self) {
        self.container.clear_scope(&self.name);
    }
}

fn downcast<T: Send + Sync + 'static>(name: &str, instance: Instance) -> Result<Arc<T>, ContainerError> {
    instance
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
}

/// A wrapper for a dependency resolved by name.
#[derive(Clone)]
pub struct Inject<T>(pub Arc<T>);

impl<T> Inject<T> {
    /// Returns a reference to the inner service.
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Converts into the inner `Arc`.
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Inject").field(&self.0).finish()
    }
}

impl<T: Send + Sync + 'static> Inject<T> {
    /// Resolves the named service from a container.
    pub fn from_container(container: &Container, name: &str) -> Result<Self, ContainerError> {
        container.resolve::<T>(name).map(Inject)
    }
}
