//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills missing ones with defaults.

use lite_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

/// HTTP server section.
///
/// ```
/// use lite_config::ServerSection;
///
/// let server = ServerSection::default();
/// assert_eq!(server.addr, "0.0.0.0:8080");
/// assert_eq!(server.request_timeout_ms, None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Listen address.
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Time given to in-flight connections on shutdown, in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Per-request timeout in milliseconds. None disables it.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

/// OpenAPI document and Swagger UI section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DocsSection {
    /// Do not serve the Swagger UI page.
    #[serde(default)]
    pub disable_swagger: bool,

    /// Do not write the YAML document to `spec_file` at startup.
    #[serde(default)]
    pub disable_local_save: bool,

    /// URL of the Swagger UI page.
    #[serde(default = "default_swagger_url")]
    pub swagger_url: String,

    /// URL of the YAML document.
    #[serde(default = "default_yaml_url")]
    pub yaml_url: String,

    /// Where the YAML document is saved.
    #[serde(default = "default_spec_file")]
    pub spec_file: String,

    /// API title.
    #[serde(default = "default_title")]
    pub title: String,

    /// API description.
    #[serde(default)]
    pub description: Option<String>,

    /// API version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Contact information.
    #[serde(default)]
    pub contact: Option<ContactSection>,

    /// License information.
    #[serde(default)]
    pub license: Option<LicenseSection>,

    /// Terms of service URL.
    #[serde(default)]
    pub terms_of_service: Option<String>,

    /// Extra servers listed in the document.
    #[serde(default)]
    pub servers: Vec<ServerEntry>,

    /// Extra tags listed in the document.
    #[serde(default)]
    pub tags: Vec<TagEntry>,
}

impl Default for DocsSection {
    fn default() -> Self {
        Self {
            disable_swagger: false,
            disable_local_save: false,
            swagger_url: default_swagger_url(),
            yaml_url: default_yaml_url(),
            spec_file: default_spec_file(),
            title: default_title(),
            description: None,
            version: default_version(),
            contact: None,
            license: None,
            terms_of_service: None,
            servers: Vec::new(),
            tags: Vec::new(),
        }
    }
}

fn default_swagger_url() -> String {
    "/swagger".to_string()
}

fn default_yaml_url() -> String {
    "/swagger/openapi.yaml".to_string()
}

fn default_spec_file() -> String {
    "doc/openapi.yaml".to_string()
}

fn default_title() -> String {
    "API".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// API contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContactSection {
    /// Contact name.
    #[serde(default)]
    pub name: Option<String>,
    /// Contact URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
}

/// API license.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LicenseSection {
    /// License name.
    pub name: String,
    /// License URL.
    #[serde(default)]
    pub url: Option<String>,
}

/// A server entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerEntry {
    /// Base URL.
    pub url: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A tag entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TagEntry {
    /// Tag name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Install a subscriber at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Level or filter directive.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Colored output.
    #[serde(default)]
    pub ansi: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: LogFormat::Json,
            ansi: false,
        }
    }
}

impl LoggingSection {
    /// Converts to the telemetry configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            ansi: self.ansi,
            ..LogConfig::default()
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}
