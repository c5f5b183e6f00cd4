//! # Metadata Reader
//!
//! Entity-mapping metadata shared by all lifecycle listeners.
//!
//! ## Overview
//!
//! Listeners never hardcode field names. The metadata reader maps a logical
//! entity type (e.g. `"article"`) to the field mappings each capability
//! needs: which field carries the soft-delete stamp, which fields carry the
//! created/updated timestamps, which field holds the sort position.
//! Mappings are defined programmatically or loaded from a YAML file, and
//! the reader is installed in the service container so listener factories
//! can resolve it.
//!
//! Mappings are read-only from a listener's perspective: a listener only
//! ever calls [`MetadataReader::read`].

use crate::constants::services;
use crate::container::{ContainerResult, ServiceContainer};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Mapping files describe a handful of field names per entity; anything
/// bigger than this is not a mapping file.
const MAX_MAPPING_FILE_SIZE: u64 = 1024 * 1024;

/// Field mapping for the soft-delete capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftDeleteMapping {
    /// Field stamped with the deletion time instead of removing the entity.
    pub field: String,
}

impl Default for SoftDeleteMapping {
    fn default() -> Self {
        Self {
            field: "deleted_at".to_string(),
        }
    }
}

/// Field mapping for the timestamping capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampMapping {
    pub created_field: String,
    pub updated_field: String,
}

impl Default for TimestampMapping {
    fn default() -> Self {
        Self {
            created_field: "created_at".to_string(),
            updated_field: "updated_at".to_string(),
        }
    }
}

/// Field mapping for the sortable capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortableMapping {
    /// Field receiving the assigned position.
    pub position_field: String,
    /// Optional field whose value partitions entities into independent
    /// sort groups.
    pub group_field: Option<String>,
}

impl Default for SortableMapping {
    fn default() -> Self {
        Self {
            position_field: "position".to_string(),
            group_field: None,
        }
    }
}

/// Capability field mappings for one logical entity type. A capability
/// whose mapping is absent is simply not applied to that entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityMetadata {
    pub soft_delete: Option<SoftDeleteMapping>,
    pub timestamps: Option<TimestampMapping>,
    pub sortable: Option<SortableMapping>,
}

/// Errors raised while loading mapping files.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The mapping file could not be read.
    #[error("Failed to read entity mapping file '{path}': {error}")]
    FileRead { path: String, error: String },

    /// The mapping file is not valid YAML or does not describe entity
    /// mappings.
    #[error("Invalid entity mapping file '{path}': {error}")]
    InvalidYaml { path: String, error: String },

    /// The path does not point at a usable mapping file.
    #[error("Entity mapping file '{path}' is not usable: {reason}")]
    InvalidMappingFile { path: String, reason: String },
}

impl MetadataError {
    /// Create a file read error.
    pub fn file_read<P: Into<String>, E: std::fmt::Display>(path: P, error: E) -> Self {
        Self::FileRead {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Create an invalid YAML error.
    pub fn invalid_yaml<P: Into<String>, E: std::fmt::Display>(path: P, error: E) -> Self {
        Self::InvalidYaml {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Create an invalid mapping file error.
    pub fn invalid_mapping_file<P: Into<String>, R: Into<String>>(path: P, reason: R) -> Self {
        Self::InvalidMappingFile {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Shared reader of entity-mapping metadata.
#[derive(Debug, Default)]
pub struct MetadataReader {
    mappings: RwLock<HashMap<String, Arc<EntityMetadata>>>,
}

impl MetadataReader {
    /// Create a reader with no mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or replace) the mapping for an entity type.
    pub fn define(&self, entity_type: &str, metadata: EntityMetadata) {
        debug!(entity_type, "Defined entity mapping");
        self.mappings
            .write()
            .insert(entity_type.to_string(), Arc::new(metadata));
    }

    /// Read the mapping for an entity type, if one was defined.
    pub fn read(&self, entity_type: &str) -> Option<Arc<EntityMetadata>> {
        self.mappings.read().get(entity_type).cloned()
    }

    /// All entity types with a defined mapping, sorted.
    pub fn entity_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.mappings.read().keys().cloned().collect();
        types.sort();
        types
    }

    /// Load entity mappings from a YAML file keyed by entity type. Returns
    /// the number of mappings loaded.
    pub fn load_from_file(&self, path: &Path) -> Result<usize, MetadataError> {
        let display = path.display().to_string();

        let file_metadata = std::fs::metadata(path)
            .map_err(|e| MetadataError::file_read(display.clone(), e))?;
        if !file_metadata.is_file() {
            return Err(MetadataError::invalid_mapping_file(
                display,
                "path must point to a regular file",
            ));
        }
        if file_metadata.len() > MAX_MAPPING_FILE_SIZE {
            return Err(MetadataError::invalid_mapping_file(
                display,
                format!(
                    "file is {} bytes, limit is {} bytes",
                    file_metadata.len(),
                    MAX_MAPPING_FILE_SIZE
                ),
            ));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| MetadataError::file_read(display.clone(), e))?;
        let parsed: HashMap<String, EntityMetadata> = serde_yaml::from_str(&content)
            .map_err(|e| MetadataError::invalid_yaml(display, e))?;

        let count = parsed.len();
        for (entity_type, metadata) in parsed {
            self.define(&entity_type, metadata);
        }
        Ok(count)
    }

    /// Install this reader in the container under its well-known service
    /// identifier, returning the shared handle for further mapping
    /// definitions.
    pub fn register(self, container: &ServiceContainer) -> ContainerResult<Arc<MetadataReader>> {
        let reader = Arc::new(self);
        container.set_shared_instance(services::METADATA_READER, &[], reader.clone())?;
        Ok(reader)
    }
}
