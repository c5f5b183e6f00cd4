//! Shared helpers for integration tests.

use entity_lifecycle::container::ServiceContainer;
use entity_lifecycle::events::EventDispatcher;
use entity_lifecycle::metadata::{
    EntityMetadata, MetadataReader, SoftDeleteMapping, SortableMapping, TimestampMapping,
};
use std::sync::Arc;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Initialize tracing once for the whole test binary. `RUST_LOG` controls
/// verbosity.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A container with both registrar prerequisites installed and an
/// `article` entity mapped for every capability.
pub fn bootstrap_container() -> (ServiceContainer, Arc<MetadataReader>, Arc<EventDispatcher>) {
    init_tracing();

    let container = ServiceContainer::new();
    let reader = MetadataReader::new().register(&container).unwrap();
    reader.define(
        "article",
        EntityMetadata {
            soft_delete: Some(SoftDeleteMapping::default()),
            timestamps: Some(TimestampMapping::default()),
            sortable: Some(SortableMapping {
                position_field: "position".to_string(),
                group_field: Some("category_id".to_string()),
            }),
        },
    );
    let dispatcher = EventDispatcher::default().register(&container).unwrap();

    (container, reader, dispatcher)
}
