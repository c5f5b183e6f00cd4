//! # Service Container
//!
//! Name-keyed container for shared services with lazy construction and
//! tag-based discovery.
//!
//! ## Overview
//!
//! The container holds every long-lived collaborator of the entity
//! lifecycle system: the metadata reader, the event dispatcher, and the
//! listener services the capability registrar adds. Services are
//! registered under string identifiers, optionally tagged, and either
//! installed eagerly or deferred behind a factory that runs on first
//! resolution.
//!
//! ## Key Features
//!
//! - **Thread-safe registration and resolution** behind a `parking_lot`
//!   read-write lock
//! - **Lazy shared services**: a deferred factory runs exactly once; the
//!   result is cached for the container's lifetime
//! - **Tag discovery** in registration order, used by the event dispatcher
//!   to find subscribers
//! - **Typed resolution** with downcast failure reported as an error
//!
//! ## Usage
//!
//! ```rust
//! use entity_lifecycle::container::ServiceContainer;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), entity_lifecycle::container::ContainerError> {
//! let container = ServiceContainer::new();
//! container.set_shared("app.answer", &[], |_| Ok(Arc::new(42u32)))?;
//!
//! let answer = container.resolve_typed::<u32>("app.answer")?;
//! assert_eq!(*answer, 42);
//! # Ok(())
//! # }
//! ```

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// A resolved, container-scoped service instance.
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// Factory invoked on first resolution of a deferred service. Receives the
/// container so it can resolve its own dependencies.
pub type ServiceFactory =
    Box<dyn Fn(&ServiceContainer) -> Result<ServiceInstance, ContainerError> + Send + Sync>;

/// Errors raised by container operations.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// No service is registered under the requested identifier.
    #[error("Service '{name}' is not registered")]
    ServiceNotFound { name: String },

    /// A service is already registered under the identifier.
    #[error("Service '{name}' is already registered")]
    DuplicateService { name: String },

    /// The service resolved but is not of the requested type.
    #[error("Service '{name}' is not of the expected type {expected}")]
    TypeMismatch { name: String, expected: String },

    /// The service's factory resolved the service it is building. This is
    /// reported instead of deadlocking on the registry lock.
    #[error("Service '{name}' is already being resolved (circular resolution)")]
    CircularResolution { name: String },
}

impl ContainerError {
    /// Create a service not found error.
    pub fn service_not_found<N: Into<String>>(name: N) -> Self {
        Self::ServiceNotFound { name: name.into() }
    }

    /// Create a duplicate service error.
    pub fn duplicate_service<N: Into<String>>(name: N) -> Self {
        Self::DuplicateService { name: name.into() }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch<N: Into<String>, E: Into<String>>(name: N, expected: E) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected: expected.into(),
        }
    }

    /// Create a circular resolution error.
    pub fn circular_resolution<N: Into<String>>(name: N) -> Self {
        Self::CircularResolution { name: name.into() }
    }
}

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

enum ServiceState {
    /// Factory not yet invoked.
    Deferred(ServiceFactory),
    /// Factory currently running outside the lock.
    Resolving,
    /// Instantiated and cached.
    Ready(ServiceInstance),
}

struct ServiceEntry {
    state: ServiceState,
    tags: Vec<String>,
    sequence: u64,
}

#[derive(Default)]
struct ServiceTable {
    entries: HashMap<String, ServiceEntry>,
    next_sequence: u64,
}

/// Name-based registry of shared services.
pub struct ServiceContainer {
    table: RwLock<ServiceTable>,
}

impl ServiceContainer {
    /// Create a new, empty container.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(ServiceTable::default()),
        }
    }

    /// Whether a service is registered under the identifier (resolved or
    /// still deferred).
    pub fn has(&self, name: &str) -> bool {
        self.table.read().entries.contains_key(name)
    }

    /// Register a shared service behind a factory. The factory runs on
    /// first resolution; the instance is cached for the container's
    /// lifetime.
    pub fn set_shared<F>(&self, name: &str, tags: &[&str], factory: F) -> ContainerResult<()>
    where
        F: Fn(&ServiceContainer) -> ContainerResult<ServiceInstance> + Send + Sync + 'static,
    {
        self.insert(name, tags, ServiceState::Deferred(Box::new(factory)))
    }

    /// Register an already-constructed shared service instance.
    pub fn set_shared_instance(
        &self,
        name: &str,
        tags: &[&str],
        instance: ServiceInstance,
    ) -> ContainerResult<()> {
        self.insert(name, tags, ServiceState::Ready(instance))
    }

    /// Resolve a service, instantiating it on first access.
    pub fn resolve(&self, name: &str) -> ContainerResult<ServiceInstance> {
        // Fast path: already instantiated.
        {
            let table = self.table.read();
            match table.entries.get(name) {
                Some(ServiceEntry {
                    state: ServiceState::Ready(instance),
                    ..
                }) => return Ok(instance.clone()),
                Some(_) => {}
                None => return Err(ContainerError::service_not_found(name)),
            }
        }

        // Claim the factory. The lock is released while it runs so the
        // factory can resolve its own dependencies from this container.
        let factory = {
            let mut table = self.table.write();
            let entry = table
                .entries
                .get_mut(name)
                .ok_or_else(|| ContainerError::service_not_found(name))?;

            match std::mem::replace(&mut entry.state, ServiceState::Resolving) {
                ServiceState::Ready(instance) => {
                    entry.state = ServiceState::Ready(instance.clone());
                    return Ok(instance);
                }
                ServiceState::Resolving => {
                    return Err(ContainerError::circular_resolution(name));
                }
                ServiceState::Deferred(factory) => factory,
            }
        };

        let result = factory(self);

        let mut table = self.table.write();
        let entry = table
            .entries
            .get_mut(name)
            .ok_or_else(|| ContainerError::service_not_found(name))?;

        match result {
            Ok(instance) => {
                debug!(service = name, "Instantiated shared service");
                entry.state = ServiceState::Ready(instance.clone());
                Ok(instance)
            }
            Err(error) => {
                // Leave the service resolvable so a later attempt can retry.
                entry.state = ServiceState::Deferred(factory);
                Err(error)
            }
        }
    }

    /// Resolve a service and downcast it to a concrete type.
    pub fn resolve_typed<T: Send + Sync + 'static>(&self, name: &str) -> ContainerResult<Arc<T>> {
        let instance = self.resolve(name)?;
        instance
            .downcast::<T>()
            .map_err(|_| ContainerError::type_mismatch(name, std::any::type_name::<T>()))
    }

    /// Identifiers of all services carrying the tag, in registration order.
    pub fn tagged(&self, tag: &str) -> Vec<String> {
        let table = self.table.read();
        let mut matches: Vec<(&u64, &String)> = table
            .entries
            .iter()
            .filter(|(_, entry)| entry.tags.iter().any(|t| t == tag))
            .map(|(name, entry)| (&entry.sequence, name))
            .collect();
        matches.sort();
        matches.into_iter().map(|(_, name)| name.clone()).collect()
    }

    /// Number of registered services.
    pub fn service_count(&self) -> usize {
        self.table.read().entries.len()
    }

    /// Identifiers of all registered services, in registration order.
    pub fn service_names(&self) -> Vec<String> {
        let table = self.table.read();
        let mut names: Vec<(&u64, &String)> = table
            .entries
            .iter()
            .map(|(name, entry)| (&entry.sequence, name))
            .collect();
        names.sort();
        names.into_iter().map(|(_, name)| name.clone()).collect()
    }

    fn insert(&self, name: &str, tags: &[&str], state: ServiceState) -> ContainerResult<()> {
        let mut table = self.table.write();
        if table.entries.contains_key(name) {
            return Err(ContainerError::duplicate_service(name));
        }

        let sequence = table.next_sequence;
        table.next_sequence += 1;
        table.entries.insert(
            name.to_string(),
            ServiceEntry {
                state,
                tags: tags.iter().map(|t| t.to_string()).collect(),
                sequence,
            },
        );

        debug!(service = name, ?tags, "Registered shared service");
        Ok(())
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.read();
        f.debug_struct("ServiceContainer")
            .field("services", &table.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_register_and_resolve_typed() {
        let container = ServiceContainer::new();
        container
            .set_shared("test.value", &[], |_| Ok(Arc::new("hello".to_string())))
            .unwrap();

        assert!(container.has("test.value"));
        let value = container.resolve_typed::<String>("test.value").unwrap();
        assert_eq!(*value, "hello");
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let container = ServiceContainer::new();
        container
            .set_shared("test.value", &[], |_| Ok(Arc::new(1u32)))
            .unwrap();

        let result = container.set_shared("test.value", &[], |_| Ok(Arc::new(2u32)));
        assert!(matches!(
            result,
            Err(ContainerError::DuplicateService { .. })
        ));
    }

    #[test]
    fn test_factory_runs_once_and_instance_is_shared() {
        let container = ServiceContainer::new();
        let invocations = Arc::new(AtomicUsize::new(0));

        let counter = invocations.clone();
        container
            .set_shared("test.lazy", &[], move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(7u64))
            })
            .unwrap();

        // Registration alone does not instantiate.
        assert_eq!(invocations.load(Ordering::SeqCst), 0);

        let first = container.resolve_typed::<u64>("test.lazy").unwrap();
        let second = container.resolve_typed::<u64>("test.lazy").unwrap();

        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_factory_can_resolve_dependencies() {
        let container = ServiceContainer::new();
        container
            .set_shared_instance("test.dependency", &[], Arc::new(10u32))
            .unwrap();
        container
            .set_shared("test.dependent", &[], |c| {
                let dependency = c.resolve_typed::<u32>("test.dependency")?;
                Ok(Arc::new(*dependency + 1))
            })
            .unwrap();

        let value = container.resolve_typed::<u32>("test.dependent").unwrap();
        assert_eq!(*value, 11);
    }

    #[test]
    fn test_circular_resolution_is_detected() {
        let container = ServiceContainer::new();
        container
            .set_shared("test.cycle", &[], |c| c.resolve("test.cycle"))
            .unwrap();

        let result = container.resolve("test.cycle");
        assert!(matches!(
            result,
            Err(ContainerError::CircularResolution { .. })
        ));
    }

    #[test]
    fn test_failed_factory_can_be_retried() {
        let container = ServiceContainer::new();
        let attempts = Arc::new(AtomicUsize::new(0));

        let counter = attempts.clone();
        container
            .set_shared("test.flaky", &[], move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ContainerError::service_not_found("test.upstream"))
                } else {
                    Ok(Arc::new(3u8))
                }
            })
            .unwrap();

        assert!(container.resolve("test.flaky").is_err());
        let value = container.resolve_typed::<u8>("test.flaky").unwrap();
        assert_eq!(*value, 3);
    }

    #[test]
    fn test_typed_resolution_mismatch() {
        let container = ServiceContainer::new();
        container
            .set_shared_instance("test.value", &[], Arc::new(1u32))
            .unwrap();

        let result = container.resolve_typed::<String>("test.value");
        assert!(matches!(result, Err(ContainerError::TypeMismatch { .. })));
    }

    #[test]
    fn test_unknown_service() {
        let container = ServiceContainer::new();
        assert!(!container.has("test.missing"));
        assert!(matches!(
            container.resolve("test.missing"),
            Err(ContainerError::ServiceNotFound { .. })
        ));
    }

    #[test]
    fn test_tagged_preserves_registration_order() {
        let container = ServiceContainer::new();
        for name in ["test.c", "test.a", "test.b"] {
            container
                .set_shared_instance(name, &["listener"], Arc::new(0u8))
                .unwrap();
        }
        container
            .set_shared_instance("test.untagged", &[], Arc::new(0u8))
            .unwrap();

        assert_eq!(container.tagged("listener"), vec!["test.c", "test.a", "test.b"]);
        assert!(container.tagged("other").is_empty());
        assert_eq!(container.service_count(), 4);
    }
}
