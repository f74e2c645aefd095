//! Server errors.

use lite_core::RegistrationError;
use lite_docs::DocsError;
use thiserror::Error;

/// Errors raised while registering routes or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A route was rejected at registration.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// The OpenAPI document could not be produced or saved.
    #[error("openapi document: {0}")]
    Docs(#[from] DocsError),

    /// The listen address is invalid or already in use.
    #[error("failed to bind {addr}: {reason}")]
    Bind {
        /// Address the server tried to bind.
        addr: String,
        /// Underlying failure.
        reason: String,
    },

    /// I/O failure while serving.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_errors_keep_their_message() {
        let err = ServerError::from(RegistrationError::InvalidPath {
            path: "/foo/:".to_string(),
            reason: "empty parameter name".to_string(),
        });
        assert_eq!(err.to_string(), "invalid route `/foo/:`: empty parameter name");
    }

    #[test]
    fn bind_message() {
        let err = ServerError::Bind {
            addr: "nope".to_string(),
            reason: "invalid socket address".to_string(),
        };
        assert_eq!(err.to_string(), "failed to bind nope: invalid socket address");
    }
}
