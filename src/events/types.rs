//! Entity lifecycle event type shared by the dispatcher and listeners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// An entity lifecycle event.
///
/// The entity travels as a JSON object so listeners can stamp fields
/// without knowing the host's concrete entity types. Listeners mutate the
/// payload in place; the host applies the mutated payload after dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityEvent {
    /// Unique event id, assigned at construction.
    pub event_id: Uuid,
    /// Lifecycle event name, one of [`crate::constants::events`].
    pub name: String,
    /// Logical entity type, the key listeners use for metadata lookups.
    pub entity_type: String,
    /// Entity payload as a JSON object.
    pub entity: Value,
    /// When the event was constructed.
    pub occurred_at: DateTime<Utc>,
}

impl EntityEvent {
    /// Create a lifecycle event for an entity payload.
    pub fn new(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        entity: Value,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            name: name.into(),
            entity_type: entity_type.into(),
            entity,
            occurred_at: Utc::now(),
        }
    }

    /// Set a field on the entity payload. Returns `false` when the payload
    /// is not a JSON object and cannot carry fields.
    pub fn set_entity_field(&mut self, field: &str, value: Value) -> bool {
        match &mut self.entity {
            Value::Object(map) => {
                map.insert(field.to_string(), value);
                true
            }
            _ => false,
        }
    }

    /// Read a field from the entity payload.
    pub fn entity_field(&self, field: &str) -> Option<&Value> {
        self.entity.as_object().and_then(|map| map.get(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::events;
    use serde_json::json;

    #[test]
    fn test_new_assigns_identity() {
        let first = EntityEvent::new(events::ENTITY_PRE_PERSIST, "article", json!({}));
        let second = EntityEvent::new(events::ENTITY_PRE_PERSIST, "article", json!({}));

        assert_ne!(first.event_id, second.event_id);
        assert_eq!(first.name, "entity.pre_persist");
        assert_eq!(first.entity_type, "article");
    }

    #[test]
    fn test_entity_field_round_trip() {
        let mut event =
            EntityEvent::new(events::ENTITY_PRE_UPDATE, "article", json!({"title": "hi"}));

        assert!(event.set_entity_field("position", json!(3)));
        assert_eq!(event.entity_field("position"), Some(&json!(3)));
        assert_eq!(event.entity_field("title"), Some(&json!("hi")));
        assert_eq!(event.entity_field("missing"), None);
    }

    #[test]
    fn test_set_field_on_non_object_payload() {
        let mut event = EntityEvent::new(events::ENTITY_PRE_REMOVE, "article", json!(42));
        assert!(!event.set_entity_field("deleted_at", json!("now")));
        assert_eq!(event.entity_field("deleted_at"), None);
    }
}
