//! Error types for the documentation crate.

use lite_core::RegistrationError;
use thiserror::Error;

/// Errors raised while building or writing the OpenAPI document.
#[derive(Debug, Error)]
pub enum DocsError {
    /// A request or response type cannot be documented.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Failed to serialize the document to YAML.
    #[error("failed to serialize OpenAPI document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Failed to serialize the document to JSON.
    #[error("failed to serialize OpenAPI document: {0}")]
    Json(#[from] serde_json::Error),

    /// The operation cannot be placed in the document.
    #[error("invalid operation '{operation_id}': {reason}")]
    InvalidOperation {
        /// The operation id.
        operation_id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// IO error when writing the document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for documentation operations.
pub type DocsResult<T> = Result<T, DocsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_errors_pass_through() {
        let err: DocsError = RegistrationError::Schema {
            context: "response".to_string(),
            reason: "type `usize` is not supported".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "cannot describe response: type `usize` is not supported"
        );
    }

    #[test]
    fn invalid_operation_names_the_operation() {
        let err = DocsError::InvalidOperation {
            operation_id: "GET/foo".to_string(),
            reason: "already documented".to_string(),
        };
        assert!(err.to_string().contains("GET/foo"));
        assert!(err.to_string().contains("already documented"));
    }
}
