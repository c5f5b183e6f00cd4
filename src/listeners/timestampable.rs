//! Timestamping listener: stamps creation and update times on entities
//! whose mapping declares timestamp fields.

use super::{EntityListener, ListenerError, ListenerResult};
use crate::constants::events;
use crate::events::EntityEvent;
use crate::metadata::MetadataReader;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Listener implementing the `timestampable` capability.
///
/// On persist the mapped created and updated fields are stamped; on update
/// only the updated field is refreshed. Timestamps are RFC 3339 strings in
/// UTC.
#[derive(Debug, Default)]
pub struct TimestampableListener {
    reader: Option<Arc<MetadataReader>>,
}

impl TimestampableListener {
    /// Create a listener without a metadata reader. The reader must be
    /// injected before the listener handles events.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityListener for TimestampableListener {
    fn name(&self) -> &'static str {
        "timestampable"
    }

    fn subscribed_events(&self) -> &'static [&'static str] {
        &[events::ENTITY_PRE_PERSIST, events::ENTITY_PRE_UPDATE]
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
        let Some(mapping) = metadata.timestamps.clone() else {
            return Ok(());
        };

        let now = Value::String(Utc::now().to_rfc3339());
        let entity_type = event.entity_type.clone();

        let stamped = match event.name.as_str() {
            events::ENTITY_PRE_PERSIST => {
                event.set_entity_field(&mapping.created_field, now.clone())
                    && event.set_entity_field(&mapping.updated_field, now)
            }
            events::ENTITY_PRE_UPDATE => event.set_entity_field(&mapping.updated_field, now),
            _ => return Ok(()),
        };

        if !stamped {
            return Err(ListenerError::invalid_entity_payload(entity_type));
        }
        Ok(())
    }
}
