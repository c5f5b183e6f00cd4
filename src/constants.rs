//! # System Constants
//!
//! Core constants and enums that define the operational vocabulary of the
//! entity lifecycle system: capability names, well-known service
//! identifiers, and lifecycle event names.
//!
//! Capability wire names are part of the external configuration contract
//! and never change casing, even where they diverge from Rust conventions.

use serde::{Deserialize, Serialize};

/// Entity lifecycle events dispatched around ORM persistence operations.
pub mod events {
    pub const ENTITY_PRE_PERSIST: &str = "entity.pre_persist";
    pub const ENTITY_POST_PERSIST: &str = "entity.post_persist";
    pub const ENTITY_PRE_UPDATE: &str = "entity.pre_update";
    pub const ENTITY_POST_UPDATE: &str = "entity.post_update";
    pub const ENTITY_PRE_REMOVE: &str = "entity.pre_remove";
    pub const ENTITY_POST_REMOVE: &str = "entity.post_remove";
}

/// Well-known service identifiers inside the service container.
pub mod services {
    /// Metadata reader service. Must be registered before the capability
    /// registrar is constructed.
    pub const METADATA_READER: &str = "entity_lifecycle.metadata_reader";

    /// Event dispatcher service. Must be registered before the capability
    /// registrar is constructed.
    pub const EVENT_DISPATCHER: &str = "entity_lifecycle.event_dispatcher";

    /// Prefix for listener services registered by the capability registrar.
    /// The full identifier is the prefix followed by the capability name.
    pub const LISTENER_PREFIX: &str = "entity_lifecycle.listener.";

    /// Tag applied to every registered listener service so the event
    /// dispatcher can discover it as a subscriber.
    pub const SUBSCRIBER_TAG: &str = "entity_lifecycle.subscriber";
}

/// Optional cross-cutting entity behaviors that can be toggled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Entities are flagged as deleted instead of being physically removed.
    #[serde(rename = "softDeleteable")]
    SoftDeleteable,
    /// Entities maintain a position within a sort group.
    #[serde(rename = "sortable")]
    Sortable,
    /// Entities track creation and update timestamps.
    #[serde(rename = "timestampable")]
    Timestampable,
}

impl Capability {
    /// All capabilities in catalog order. Registration iterates this order.
    pub const ALL: [Capability; 3] = [
        Capability::SoftDeleteable,
        Capability::Sortable,
        Capability::Timestampable,
    ];

    /// The capability's wire name as it appears in configuration maps and
    /// composed service identifiers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::SoftDeleteable => "softDeleteable",
            Capability::Sortable => "sortable",
            Capability::Timestampable => "timestampable",
        }
    }

    /// Parse a wire name back into a capability.
    pub fn from_wire_name(name: &str) -> Option<Capability> {
        Capability::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// The composed service identifier this capability's listener is
    /// registered under.
    pub fn listener_service_id(&self) -> String {
        format!("{}{}", services::LISTENER_PREFIX, self.as_str())
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
