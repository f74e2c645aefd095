//! # Lite Telemetry
//!
//! Logging bootstrap for lite services.
//!
//! ```rust,no_run
//! use lite_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development()).expect("logging");
//! tracing::info!(addr = "0.0.0.0:8080", "listening");
//! ```

#![doc(html_root_url = "https://docs.rs/lite-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, is_known_level, LogConfig, LogFormat, LEVELS};

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
