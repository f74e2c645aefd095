//! # Lite Config
//!
//! Typed, layered configuration for lite services: defaults, then TOML or
//! JSON files, then `LITE__SECTION__KEY` environment variables. Unknown
//! fields are rejected.
//!
//! ```toml
//! [server]
//! addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! max_body_bytes = 10485760
//!
//! [docs]
//! title = "Pet Store"
//! version = "1.2.0"
//! swagger_url = "/swagger"
//! yaml_url = "/swagger/openapi.yaml"
//! spec_file = "doc/openapi.yaml"
//!
//! [[docs.tags]]
//! name = "pets"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

#![doc(html_root_url = "https://docs.rs/lite-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::LiteConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use lite_telemetry::LogFormat;
pub use schema::{
    ContactSection, DocsSection, LicenseSection, LoggingSection, ServerEntry, ServerSection,
    TagEntry,
};
