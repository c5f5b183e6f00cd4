//! # Registrar Error Types
//!
//! Error handling for capability registration. The registrar surfaces a
//! deliberately small set of error kinds: invalid configuration input,
//! missing prerequisite services, and container errors passed through
//! unchanged.

use crate::container::ContainerError;
use thiserror::Error;

/// Errors raised while constructing the capability registrar.
#[derive(Debug, Error)]
pub enum RegistrarError {
    /// The configuration input is not a flat map of capability name to
    /// boolean (and is not convertible to one).
    #[error("Invalid capability configuration: {reason}")]
    InvalidArgument { reason: String },

    /// A prerequisite service is missing from the container. Registration
    /// aborts before any listener service is added.
    #[error("{component} was not found (expected service '{service}'). Did you register it before the capability registrar?")]
    InvalidState { component: String, service: String },

    /// An error from the underlying service container, propagated
    /// unmodified.
    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl RegistrarError {
    /// Create an invalid argument error for a malformed configuration input.
    pub fn invalid_argument<R: Into<String>>(reason: R) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create an invalid state error naming the missing prerequisite.
    pub fn missing_prerequisite<C: Into<String>, S: Into<String>>(component: C, service: S) -> Self {
        Self::InvalidState {
            component: component.into(),
            service: service.into(),
        }
    }
}

/// Result type for registrar operations.
pub type RegistrarResult<T> = Result<T, RegistrarError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::services;

    #[test]
    fn test_invalid_argument_message() {
        let error = RegistrarError::invalid_argument("expected an object, got array");

        let error_string = error.to_string();
        assert!(error_string.contains("Invalid capability configuration"));
        assert!(error_string.contains("expected an object, got array"));
    }

    #[test]
    fn test_missing_prerequisite_message_names_service() {
        let error =
            RegistrarError::missing_prerequisite("Metadata reader", services::METADATA_READER);

        let error_string = error.to_string();
        assert!(error_string.contains("Metadata reader was not found"));
        assert!(error_string.contains(services::METADATA_READER));
        assert!(error_string.contains("Did you register it before"));
    }

    #[test]
    fn test_container_error_passes_through_unchanged() {
        let container_error = ContainerError::duplicate_service("entity_lifecycle.listener.sortable");
        let expected = container_error.to_string();

        let error: RegistrarError = container_error.into();
        assert_eq!(error.to_string(), expected);
    }
}
