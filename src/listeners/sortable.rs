//! Sortable listener: assigns a position to newly persisted entities
//! within their sort group.

use super::{EntityListener, ListenerError, ListenerResult};
use crate::constants::events;
use crate::events::EntityEvent;
use crate::metadata::MetadataReader;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Listener implementing the `sortable` capability.
///
/// Positions are assigned per sort group in insertion order, starting at
/// zero. The group is the value of the mapped group field; entities
/// without a group field mapping share a single group. An entity that
/// already carries an explicit position keeps it.
#[derive(Debug, Default)]
pub struct SortableListener {
    reader: Option<Arc<MetadataReader>>,
    positions: Mutex<HashMap<String, i64>>,
}

impl SortableListener {
    /// Create a listener without a metadata reader. The reader must be
    /// injected before the listener handles events.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_position(&self, group: &str) -> i64 {
        let mut positions = self.positions.lock();
        let counter = positions.entry(group.to_string()).or_insert(0);
        let position = *counter;
        *counter += 1;
        position
    }
}

#[async_trait]
impl EntityListener for SortableListener {
    fn name(&self) -> &'static str {
        "sortable"
    }

    fn subscribed_events(&self) -> &'static [&'static str] {
        &[events::ENTITY_PRE_PERSIST]
    }

    fn set_metadata_reader(&mut self, reader: Arc<MetadataReader>) {
        self.reader = Some(reader);
    }

    async fn handle_event(&self, event: &mut EntityEvent) -> ListenerResult<()> {
        let reader = self
            .reader
            .as_ref()
            .ok_or_else(|| ListenerError::reader_not_injected(self.name()))?;

        let Some(metadata) = reader.read(&event.entity_type) else {
            debug!(entity_type = %event.entity_type, "No mapping for entity type, skipping");
            return Ok(());
        };
        let Some(mapping) = metadata.sortable.clone() else {
            return Ok(());
        };

        // An explicit position wins; the group counter is not advanced.
        if matches!(
            event.entity_field(&mapping.position_field),
            Some(value) if !value.is_null()
        ) {
            return Ok(());
        }

        let group = match &mapping.group_field {
            Some(field) => {
                let key = event
                    .entity_field(field)
                    .cloned()
                    .unwrap_or(Value::Null)
                    .to_string();
                format!("{}:{}:{}", event.entity_type, field, key)
            }
            None => event.entity_type.clone(),
        };

        let entity_type = event.entity_type.clone();
        let position = self.next_position(&group);
        if !event.set_entity_field(&mapping.position_field, Value::from(position)) {
            return Err(ListenerError::invalid_entity_payload(entity_type));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{EntityMetadata, SortableMapping};
    use serde_json::json;

    fn listener_with_mapping(group_field: Option<&str>) -> SortableListener {
        let reader = MetadataReader::new();
        reader.define(
            "category",
            EntityMetadata {
                sortable: Some(SortableMapping {
                    position_field: "position".to_string(),
                    group_field: group_field.map(str::to_string),
                }),
                ..Default::default()
            },
        );

        let mut listener = SortableListener::new();
        listener.set_metadata_reader(Arc::new(reader));
        listener
    }

    fn persist(listener: &SortableListener, entity: Value) -> EntityEvent {
        let mut event = EntityEvent::new(events::ENTITY_PRE_PERSIST, "category", entity);
        tokio_test::block_on(listener.handle_event(&mut event)).unwrap();
        event
    }

    #[test]
    fn test_positions_are_sequential() {
        let listener = listener_with_mapping(None);

        for expected in 0..3 {
            let event = persist(&listener, json!({"name": "n"}));
            assert_eq!(event.entity_field("position"), Some(&json!(expected)));
        }
    }

    #[test]
    fn test_groups_are_independent() {
        let listener = listener_with_mapping(Some("parent_id"));

        let first_a = persist(&listener, json!({"parent_id": 1}));
        let second_a = persist(&listener, json!({"parent_id": 1}));
        let first_b = persist(&listener, json!({"parent_id": 2}));

        assert_eq!(first_a.entity_field("position"), Some(&json!(0)));
        assert_eq!(second_a.entity_field("position"), Some(&json!(1)));
        assert_eq!(first_b.entity_field("position"), Some(&json!(0)));
    }

    #[test]
    fn test_explicit_position_is_kept() {
        let listener = listener_with_mapping(None);

        let explicit = persist(&listener, json!({"position": 40}));
        assert_eq!(explicit.entity_field("position"), Some(&json!(40)));

        // The counter did not advance for the explicit entity.
        let assigned = persist(&listener, json!({}));
        assert_eq!(assigned.entity_field("position"), Some(&json!(0)));
    }

    #[test]
    fn test_unmapped_entity_type_is_skipped() {
        let listener = listener_with_mapping(None);
        let mut event = EntityEvent::new(events::ENTITY_PRE_PERSIST, "article", json!({}));

        tokio_test::block_on(listener.handle_event(&mut event)).unwrap();
        assert_eq!(event.entity_field("position"), None);
    }
}
