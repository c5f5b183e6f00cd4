//! # Entity Listeners
//!
//! Lifecycle listeners implementing the optional entity capabilities.
//!
//! ## Overview
//!
//! Each capability is implemented by one listener. A listener declares the
//! lifecycle events it reacts to, receives the shared metadata reader
//! before it is shared (the registrar's factory injects it), and applies
//! its behavior to the entity payload of matching events. An entity type
//! with no mapping for the listener's capability is skipped silently.

pub mod soft_deleteable;
pub mod sortable;
pub mod timestampable;

// Re-export the concrete listeners for easy access
pub use soft_deleteable::SoftDeleteableListener;
pub use sortable::SortableListener;
pub use timestampable::TimestampableListener;

use crate::events::EntityEvent;
use crate::metadata::MetadataReader;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while a listener handles an event.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The listener was invoked before its metadata reader was injected.
    /// The registrar's factory always injects the reader, so this only
    /// happens with hand-wired listeners.
    #[error("Listener '{listener}' was invoked before a metadata reader was injected")]
    ReaderNotInjected { listener: String },

    /// The entity has a mapping for the capability but its payload is not
    /// a JSON object, so no field can be stamped.
    #[error("Entity payload for '{entity_type}' is not an object")]
    InvalidEntityPayload { entity_type: String },
}

impl ListenerError {
    /// Create a reader not injected error.
    pub fn reader_not_injected<L: Into<String>>(listener: L) -> Self {
        Self::ReaderNotInjected {
            listener: listener.into(),
        }
    }

    /// Create an invalid entity payload error.
    pub fn invalid_entity_payload<E: Into<String>>(entity_type: E) -> Self {
        Self::InvalidEntityPayload {
            entity_type: entity_type.into(),
        }
    }
}

/// Result type for listener operations.
pub type ListenerResult<T> = Result<T, ListenerError>;

/// A lifecycle event subscriber implementing one entity capability.
#[async_trait]
pub trait EntityListener: Send + Sync {
    /// Stable listener name used in logs and dispatch errors.
    fn name(&self) -> &'static str;

    /// Lifecycle event names this listener reacts to. The dispatcher skips
    /// the listener for any other event.
    fn subscribed_events(&self) -> &'static [&'static str];

    /// Inject the shared metadata reader. Called once while the listener
    /// is being constructed, before the instance is shared.
    fn set_metadata_reader(&mut self, reader: Arc<MetadataReader>);

    /// Apply the listener's behavior to an event.
    async fn handle_event(&self, event: &mut EntityEvent) -> ListenerResult<()>;
}
