//! # Capability Registrar
//!
//! Conditional registration of entity lifecycle listeners.
//!
//! ## Overview
//!
//! The registrar turns capability flags into listener services. Given a
//! container that already exposes the metadata reader and the event
//! dispatcher, it validates the configuration, merges it over defaults
//! (caller-supplied values win; unspecified capabilities stay disabled),
//! and walks a fixed catalog of capability bindings in declared order. For
//! every capability resolved to `true` it registers one shared listener
//! service under `entity_lifecycle.listener.<capability>`, tagged so the
//! dispatcher discovers it as a subscriber.
//!
//! Listener construction is deferred: the registered factory runs on first
//! resolution, injects the container's metadata reader through the
//! listener's reader-setter, and the container caches the instance for its
//! lifetime. The registrar keeps no reference to the listeners it
//! registers.
//!
//! Prerequisites are checked eagerly, before anything is registered: a
//! container missing the metadata reader or the event dispatcher fails
//! construction with an invalid state error and is left untouched.
//!
//! ## Usage
//!
//! ```rust
//! use entity_lifecycle::constants::Capability;
//! use entity_lifecycle::container::ServiceContainer;
//! use entity_lifecycle::events::EventDispatcher;
//! use entity_lifecycle::metadata::MetadataReader;
//! use entity_lifecycle::registrar::CapabilityRegistrar;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let container = ServiceContainer::new();
//! MetadataReader::new().register(&container)?;
//! EventDispatcher::default().register(&container)?;
//!
//! let registrar = CapabilityRegistrar::register(
//!     &container,
//!     Some(json!({"softDeleteable": true})),
//! )?;
//!
//! assert_eq!(registrar.enabled_capabilities(), &[Capability::SoftDeleteable]);
//! assert!(container.has("entity_lifecycle.listener.softDeleteable"));
//! # Ok(())
//! # }
//! ```

use crate::config::CapabilityConfig;
use crate::constants::{services, Capability};
use crate::container::{ServiceContainer, ServiceInstance};
use crate::error::{RegistrarError, RegistrarResult};
use crate::listeners::{
    EntityListener, SoftDeleteableListener, SortableListener, TimestampableListener,
};
use crate::metadata::MetadataReader;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Constructs a listener wired with the shared metadata reader.
type ListenerBuilder = fn(Arc<MetadataReader>) -> Arc<dyn EntityListener>;

struct ListenerBinding {
    capability: Capability,
    build: ListenerBuilder,
}

/// Catalog of capability-to-listener bindings. Fixed at build time;
/// registration iterates it in declared order.
const CATALOG: &[ListenerBinding] = &[
    ListenerBinding {
        capability: Capability::SoftDeleteable,
        build: build_soft_deleteable,
    },
    ListenerBinding {
        capability: Capability::Sortable,
        build: build_sortable,
    },
    ListenerBinding {
        capability: Capability::Timestampable,
        build: build_timestampable,
    },
];

fn build_soft_deleteable(reader: Arc<MetadataReader>) -> Arc<dyn EntityListener> {
    let mut listener = SoftDeleteableListener::new();
    listener.set_metadata_reader(reader);
    Arc::new(listener)
}

fn build_sortable(reader: Arc<MetadataReader>) -> Arc<dyn EntityListener> {
    let mut listener = SortableListener::new();
    listener.set_metadata_reader(reader);
    Arc::new(listener)
}

fn build_timestampable(reader: Arc<MetadataReader>) -> Arc<dyn EntityListener> {
    let mut listener = TimestampableListener::new();
    listener.set_metadata_reader(reader);
    Arc::new(listener)
}

/// Registers lifecycle listener services for enabled capabilities.
#[derive(Debug)]
pub struct CapabilityRegistrar {
    enabled: Vec<Capability>,
    registered_services: Vec<String>,
}

impl CapabilityRegistrar {
    /// Construct the registrar from an untyped configuration value. The
    /// value must be a flat map of capability name to boolean.
    pub fn new(container: &ServiceContainer, config: Value) -> RegistrarResult<Self> {
        let config = CapabilityConfig::from_value(&config)?;
        Self::with_config(container, config)
    }

    /// Construct the registrar from a typed configuration.
    pub fn with_config(
        container: &ServiceContainer,
        config: CapabilityConfig,
    ) -> RegistrarResult<Self> {
        // Both prerequisites are checked before anything is registered, so
        // a failed construction leaves the container untouched.
        if !container.has(services::METADATA_READER) {
            return Err(RegistrarError::missing_prerequisite(
                "Metadata reader",
                services::METADATA_READER,
            ));
        }
        if !container.has(services::EVENT_DISPATCHER) {
            return Err(RegistrarError::missing_prerequisite(
                "Event dispatcher",
                services::EVENT_DISPATCHER,
            ));
        }

        let mut registrar = Self {
            enabled: Vec::new(),
            registered_services: Vec::new(),
        };
        registrar.load_capabilities(container, &config)?;
        Ok(registrar)
    }

    /// Convenience entry point: construct the registrar with an optional
    /// configuration, defaulting to everything disabled.
    pub fn register(
        container: &ServiceContainer,
        config: Option<Value>,
    ) -> RegistrarResult<Self> {
        match config {
            Some(value) => Self::new(container, value),
            None => Self::with_config(container, CapabilityConfig::default()),
        }
    }

    /// Capabilities that were enabled, in catalog order.
    pub fn enabled_capabilities(&self) -> &[Capability] {
        &self.enabled
    }

    /// Service identifiers registered for the enabled capabilities, in
    /// catalog order.
    pub fn registered_services(&self) -> &[String] {
        &self.registered_services
    }

    fn load_capabilities(
        &mut self,
        container: &ServiceContainer,
        config: &CapabilityConfig,
    ) -> RegistrarResult<()> {
        for binding in CATALOG {
            let capability = binding.capability;
            if !config.resolved(capability) {
                debug!(capability = %capability, "Capability disabled, skipping");
                continue;
            }

            let service_id = capability.listener_service_id();
            let build = binding.build;
            container.set_shared(&service_id, &[services::SUBSCRIBER_TAG], move |c| {
                let reader = c.resolve_typed::<MetadataReader>(services::METADATA_READER)?;
                let listener = build(reader);
                Ok(Arc::new(listener) as ServiceInstance)
            })?;

            info!(capability = %capability, service = %service_id, "Registered lifecycle listener");
            self.enabled.push(capability);
            self.registered_services.push(service_id);
        }
        Ok(())
    }
}
