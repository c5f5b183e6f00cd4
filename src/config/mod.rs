//! # Capability Configuration
//!
//! Validation and defaults handling for the capability flag map.
//!
//! ## Overview
//!
//! Callers toggle capabilities with a flat map of capability name to
//! boolean. Input arrives either as an untyped [`serde_json::Value`]
//! (validated by [`CapabilityConfig::from_value`]) or as an already-typed
//! [`CapabilityConfig`]. Every capability defaults to disabled; merging is
//! caller-over-defaults, so a supplied value always wins and anything left
//! unspecified stays off.
//!
//! Unknown keys are tolerated (with a warning) as long as the map shape is
//! valid; any non-map input or non-boolean value is rejected.

pub mod loader;

pub use loader::ConfigFileError;

use crate::constants::Capability;
use crate::error::{RegistrarError, RegistrarResult};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Resolved capability flags. Absent capabilities are disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityConfig {
    values: HashMap<Capability, bool>,
}

impl CapabilityConfig {
    /// Create a configuration with every capability at its default
    /// (disabled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a capability flag, returning the configuration for chaining.
    pub fn with(mut self, capability: Capability, enabled: bool) -> Self {
        self.set(capability, enabled);
        self
    }

    /// Set a capability flag.
    pub fn set(&mut self, capability: Capability, enabled: bool) {
        self.values.insert(capability, enabled);
    }

    /// Validate an untyped configuration value. The value must be a flat
    /// map of capability name to boolean; anything else is rejected.
    pub fn from_value(value: &Value) -> RegistrarResult<Self> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(RegistrarError::invalid_argument(format!(
                    "expected a flat map of capability flags, got {}",
                    json_type_name(other)
                )));
            }
        };

        let mut config = Self::new();
        for (key, entry) in map {
            let enabled = match entry {
                Value::Bool(enabled) => *enabled,
                other => {
                    return Err(RegistrarError::invalid_argument(format!(
                        "value for '{}' must be a boolean, got {}",
                        key,
                        json_type_name(other)
                    )));
                }
            };

            match Capability::from_wire_name(key) {
                Some(capability) => config.set(capability, enabled),
                None => warn!(key = %key, "Ignoring unknown capability flag"),
            }
        }

        Ok(config)
    }

    /// The resolved flag for a capability: the caller-supplied value if
    /// present, the default (`false`) otherwise.
    pub fn resolved(&self, capability: Capability) -> bool {
        self.values.get(&capability).copied().unwrap_or(false)
    }

    /// The full merged flag set in catalog order, defaults filled in for
    /// every capability the caller left unspecified.
    pub fn merged(&self) -> Vec<(Capability, bool)> {
        Capability::ALL
            .into_iter()
            .map(|capability| (capability, self.resolved(capability)))
            .collect()
    }

    /// Capabilities whose resolved flag is enabled, in catalog order.
    pub fn enabled_capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|capability| self.resolved(*capability))
            .collect()
    }
}

impl TryFrom<Value> for CapabilityConfig {
    type Error = RegistrarError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_are_all_disabled() {
        let config = CapabilityConfig::new();
        for capability in Capability::ALL {
            assert!(!config.resolved(capability));
        }
        assert!(config.enabled_capabilities().is_empty());
    }

    #[test]
    fn test_caller_values_win_over_defaults() {
        let config = CapabilityConfig::new()
            .with(Capability::SoftDeleteable, true)
            .with(Capability::Sortable, false);

        assert!(config.resolved(Capability::SoftDeleteable));
        assert!(!config.resolved(Capability::Sortable));
        assert!(!config.resolved(Capability::Timestampable));
        assert_eq!(
            config.enabled_capabilities(),
            vec![Capability::SoftDeleteable]
        );
    }

    #[test]
    fn test_merged_covers_every_capability_in_catalog_order() {
        let config = CapabilityConfig::new().with(Capability::Timestampable, true);

        assert_eq!(
            config.merged(),
            vec![
                (Capability::SoftDeleteable, false),
                (Capability::Sortable, false),
                (Capability::Timestampable, true),
            ]
        );
    }

    #[test]
    fn test_from_value_accepts_flat_bool_map() {
        let config =
            CapabilityConfig::from_value(&json!({"softDeleteable": true, "sortable": false}))
                .unwrap();

        assert!(config.resolved(Capability::SoftDeleteable));
        assert!(!config.resolved(Capability::Sortable));
        assert!(!config.resolved(Capability::Timestampable));
    }

    #[test]
    fn test_from_value_accepts_empty_map() {
        let config = CapabilityConfig::from_value(&json!({})).unwrap();
        assert!(config.enabled_capabilities().is_empty());
    }

    #[test]
    fn test_from_value_ignores_unknown_keys() {
        let config =
            CapabilityConfig::from_value(&json!({"timestampable": true, "treeNested": true}))
                .unwrap();

        assert_eq!(
            config.enabled_capabilities(),
            vec![Capability::Timestampable]
        );
    }

    #[test]
    fn test_from_value_rejects_non_map_input() {
        for value in [
            json!(null),
            json!(true),
            json!(3),
            json!("softDeleteable"),
            json!(["softDeleteable"]),
        ] {
            let result = CapabilityConfig::from_value(&value);
            assert!(
                matches!(result, Err(RegistrarError::InvalidArgument { .. })),
                "expected InvalidArgument for {value}"
            );
        }
    }

    #[test]
    fn test_from_value_rejects_non_boolean_flag() {
        let result = CapabilityConfig::from_value(&json!({"softDeleteable": "yes"}));

        match result {
            Err(RegistrarError::InvalidArgument { reason }) => {
                assert!(reason.contains("softDeleteable"));
                assert!(reason.contains("boolean"));
            }
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_from_value_rejects_nested_map() {
        let result = CapabilityConfig::from_value(&json!({"softDeleteable": {"enabled": true}}));
        assert!(matches!(result, Err(RegistrarError::InvalidArgument { .. })));
    }

    #[test]
    fn test_try_from_value() {
        let config = CapabilityConfig::try_from(json!({"sortable": true})).unwrap();
        assert_eq!(config.enabled_capabilities(), vec![Capability::Sortable]);
    }
}
