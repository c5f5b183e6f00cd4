#![allow(clippy::doc_markdown)] // Allow technical terms like YAML, RFC in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Entity Lifecycle
//!
//! Conditional registration of entity lifecycle behaviors for ORM event
//! pipelines.
//!
//! ## Overview
//!
//! Persistence layers often want the same cross-cutting behaviors bolted
//! onto entities: soft deletion, sortable ordering, created/updated
//! timestamps. This crate wires those behaviors as toggleable
//! capabilities. A [`registrar::CapabilityRegistrar`] reads a flat boolean
//! configuration, merges it over all-disabled defaults (caller-supplied
//! values win), and registers one lazily-constructed, container-scoped
//! listener service per enabled capability. Listener services are tagged
//! so the [`events::EventDispatcher`] discovers them as subscribers of
//! entity lifecycle events.
//!
//! Two services must already live in the container before the registrar is
//! constructed: the [`metadata::MetadataReader`] (which listeners consult
//! for per-entity field mappings) and the event dispatcher. A missing
//! prerequisite fails construction eagerly, before anything is registered.
//!
//! ## Architecture
//!
//! ```text
//! CapabilityConfig ──▶ CapabilityRegistrar ──▶ ServiceContainer
//!                          │                        │ lazy, shared,
//!                          │ catalog order          │ tagged services
//!                          ▼                        ▼
//!                    ListenerBinding ──────▶ EntityListener instances
//!                                                   ▲
//!                    EventDispatcher ──────────────┘ tag discovery
//! ```
//!
//! ## Module Organization
//!
//! - [`registrar`] - Conditional capability registration
//! - [`container`] - Name-keyed shared service container
//! - [`config`] - Capability flag validation and defaults merge
//! - [`metadata`] - Entity-mapping metadata reader
//! - [`events`] - Lifecycle event type and dispatcher
//! - [`listeners`] - Listener trait and the concrete capability listeners
//! - [`constants`] - Capability names, service identifiers, event names
//! - [`error`] - Registrar error kinds
//!
//! ## Quick Start
//!
//! ```rust
//! use entity_lifecycle::container::ServiceContainer;
//! use entity_lifecycle::events::EventDispatcher;
//! use entity_lifecycle::metadata::{EntityMetadata, MetadataReader, TimestampMapping};
//! use entity_lifecycle::registrar::CapabilityRegistrar;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let container = ServiceContainer::new();
//!
//! let reader = MetadataReader::new().register(&container)?;
//! reader.define(
//!     "article",
//!     EntityMetadata {
//!         timestamps: Some(TimestampMapping::default()),
//!         ..Default::default()
//!     },
//! );
//! EventDispatcher::default().register(&container)?;
//!
//! CapabilityRegistrar::register(&container, Some(json!({"timestampable": true})))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod container;
pub mod error;
pub mod events;
pub mod listeners;
pub mod metadata;
pub mod registrar;

// Re-export the main surface for easy access
pub use config::CapabilityConfig;
pub use constants::Capability;
pub use container::{ContainerError, ServiceContainer};
pub use error::{RegistrarError, RegistrarResult};
pub use events::{EntityEvent, EventDispatcher};
pub use listeners::EntityListener;
pub use metadata::{EntityMetadata, MetadataReader};
pub use registrar::CapabilityRegistrar;
