//! Telemetry error types.

use thiserror::Error;

/// Errors raised while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level or filter directive could not be parsed.
    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidFilter {
        /// Directive as given.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("logging is already initialized")]
    AlreadyInitialized,
}
