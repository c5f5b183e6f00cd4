//! Configuration Loader
//!
//! YAML file loading for capability configuration. The file carries the
//! same flat capability-name-to-boolean map the untyped value path
//! accepts; the loader only adds file handling on top of the shared shape
//! validation.

use super::CapabilityConfig;
use crate::error::RegistrarError;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Capability files hold at most a handful of flags.
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Errors raised while loading a capability configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The configuration file could not be read.
    #[error("Failed to read capability configuration '{path}': {error}")]
    FileRead { path: String, error: String },

    /// The configuration file is not valid YAML.
    #[error("Invalid YAML in capability configuration '{path}': {error}")]
    InvalidYaml { path: String, error: String },

    /// The path does not point at a usable configuration file.
    #[error("Capability configuration '{path}' is not usable: {reason}")]
    InvalidFile { path: String, reason: String },

    /// The file parsed but does not hold a flat map of capability flags.
    #[error(transparent)]
    InvalidShape(#[from] RegistrarError),
}

impl ConfigFileError {
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

    /// Create an invalid file error.
    pub fn invalid_file<P: Into<String>, R: Into<String>>(path: P, reason: R) -> Self {
        Self::InvalidFile {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl CapabilityConfig {
    /// Load a capability configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigFileError> {
        let display_path = path.display().to_string();

        let file_metadata = std::fs::metadata(path)
            .map_err(|e| ConfigFileError::file_read(display_path.clone(), e))?;
        if !file_metadata.is_file() {
            return Err(ConfigFileError::invalid_file(
                display_path,
                "path must point to a regular file",
            ));
        }
        if file_metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigFileError::invalid_file(
                display_path,
                format!(
                    "file is {} bytes, limit is {} bytes",
                    file_metadata.len(),
                    MAX_CONFIG_FILE_SIZE
                ),
            ));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigFileError::file_read(display_path.clone(), e))?;
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
            .map_err(|e| ConfigFileError::invalid_yaml(display_path.clone(), e))?;
        let value = serde_json::to_value(&yaml)
            .map_err(|e| ConfigFileError::invalid_yaml(display_path.clone(), e))?;

        let config = Self::from_value(&value)?;
        debug!(path = %display_path, "Loaded capability configuration");
        Ok(config)
    }
}
