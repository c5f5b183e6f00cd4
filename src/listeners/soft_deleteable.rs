//! Soft-delete listener: stamps a deletion time on entities whose mapping
//! declares a soft-delete field, so the host can keep the row instead of
//! removing it.

use super::{EntityListener, ListenerError, ListenerResult};
use crate::constants::events;
use crate::events::EntityEvent;
use crate::metadata::MetadataReader;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Listener implementing the `softDeleteable` capability.
#[derive(Debug, Default)]
pub struct SoftDeleteableListener {
    reader: Option<Arc<MetadataReader>>,
}

impl SoftDeleteableListener {
    /// Create a listener without a metadata reader. The reader must be
    /// injected before the listener handles events.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityListener for SoftDeleteableListener {
    fn name(&self) -> &'static str {
        "soft_deleteable"
    }

    fn subscribed_events(&self) -> &'static [&'static str] {
        &[events::ENTITY_PRE_REMOVE]
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
        let Some(mapping) = metadata.soft_delete.clone() else {
            return Ok(());
        };

        let entity_type = event.entity_type.clone();
        let deleted_at = Value::String(Utc::now().to_rfc3339());
        if !event.set_entity_field(&mapping.field, deleted_at) {
            return Err(ListenerError::invalid_entity_payload(entity_type));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{EntityMetadata, SoftDeleteMapping};
    use serde_json::json;

    fn listener_with_mapping(field: &str) -> SoftDeleteableListener {
        let reader = MetadataReader::new();
        reader.define(
            "article",
            EntityMetadata {
                soft_delete: Some(SoftDeleteMapping {
                    field: field.to_string(),
                }),
                ..Default::default()
            },
        );

        let mut listener = SoftDeleteableListener::new();
        listener.set_metadata_reader(Arc::new(reader));
        listener
    }

    #[test]
    fn test_remove_stamps_mapped_field() {
        let listener = listener_with_mapping("removed_at");
        let mut event =
            EntityEvent::new(events::ENTITY_PRE_REMOVE, "article", json!({"id": 1}));

        tokio_test::block_on(listener.handle_event(&mut event)).unwrap();

        let stamp = event.entity_field("removed_at").unwrap();
        assert!(stamp.is_string());
        assert_eq!(event.entity_field("id"), Some(&json!(1)));
    }

    #[test]
    fn test_entity_without_soft_delete_mapping_is_untouched() {
        let reader = MetadataReader::new();
        reader.define("article", EntityMetadata::default());

        let mut listener = SoftDeleteableListener::new();
        listener.set_metadata_reader(Arc::new(reader));

        let mut event =
            EntityEvent::new(events::ENTITY_PRE_REMOVE, "article", json!({"id": 1}));
        tokio_test::block_on(listener.handle_event(&mut event)).unwrap();

        assert_eq!(event.entity, json!({"id": 1}));
    }

    #[test]
    fn test_missing_reader_is_an_error() {
        let listener = SoftDeleteableListener::new();
        let mut event = EntityEvent::new(events::ENTITY_PRE_REMOVE, "article", json!({}));

        let result = tokio_test::block_on(listener.handle_event(&mut event));
        assert!(matches!(result, Err(ListenerError::ReaderNotInjected { .. })));
    }
}
