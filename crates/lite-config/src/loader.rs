//! Layered configuration loading.
//!
//! Layers are applied in order, later ones overriding earlier ones field by
//! field: defaults, then files and strings, then `PREFIX__SECTION__KEY`
//! environment variables.

use std::env;
use std::fs;
use std::path::Path;

use lite_telemetry::LogFormat;
use serde_json::Value;

use crate::{ConfigError, LiteConfig};

/// Configuration loader.
///
/// ```no_run
/// use lite_config::ConfigLoader;
///
/// # fn main() -> Result<(), lite_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_optional_file("lite.toml")?
///     .with_dotenv()?
///     .with_env_prefix("LITE")
///     .load()?;
/// # let _ = config;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: LiteConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: LiteConfig::default(),
            env_prefix: None,
        }
    }

    /// Resets to the default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = LiteConfig::default();
        self
    }

    /// Merges a `.toml` or `.json` file.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some(format @ ("toml" | "json")) => self.with_string(&content, format),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Merges a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merges configuration text in `format` (`toml` or `json`).
    ///
    /// ```
    /// use lite_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[server]\naddr = \"127.0.0.1:3000\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.addr, "127.0.0.1:3000");
    /// assert_eq!(config.docs.swagger_url, "/swagger");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        // parse into the typed config first so unknown fields are reported
        // against the source format
        let overlay: Value = match format.to_lowercase().as_str() {
            "toml" => {
                let _: LiteConfig = toml::from_str(content)?;
                toml::from_str(content)?
            }
            "json" => {
                let _: LiteConfig = serde_json::from_str(content)?;
                serde_json::from_str(content)?
            }
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };

        let mut merged = serde_json::to_value(&self.config)?;
        merge(&mut merged, overlay);
        self.config = serde_json::from_value(merged)?;
        Ok(self)
    }

    /// Loads a `.env` file into the process environment, if there is one.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::Dotenv(e.to_string())),
        }
    }

    /// Enables `PREFIX__SECTION__KEY` overrides.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies environment overrides and validates.
    pub fn load(self) -> Result<LiteConfig, ConfigError> {
        let config = self.load_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides without validating.
    pub fn load_unvalidated(self) -> Result<LiteConfig, ConfigError> {
        self.load_env()
    }

    fn load_env(mut self) -> Result<LiteConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            let mut vars: Vec<(String, String)> =
                env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();
            vars.sort();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }
        Ok(self.config)
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let rest = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;
        let parts: Vec<&str> = rest.split("__").collect();

        let server = &mut self.config.server;
        let docs = &mut self.config.docs;
        let logging = &mut self.config.logging;
        match parts.as_slice() {
            ["SERVER", "ADDR"] => server.addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                server.request_timeout_ms = if value.is_empty() || value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(parse_number(key, value)?)
                };
            }
            ["SERVER", "MAX_BODY_BYTES"] => server.max_body_bytes = parse_number(key, value)?,

            ["DOCS", "DISABLE_SWAGGER"] => docs.disable_swagger = parse_flag(key, value)?,
            ["DOCS", "DISABLE_LOCAL_SAVE"] => docs.disable_local_save = parse_flag(key, value)?,
            ["DOCS", "SWAGGER_URL"] => docs.swagger_url = value.to_string(),
            ["DOCS", "YAML_URL"] => docs.yaml_url = value.to_string(),
            ["DOCS", "SPEC_FILE"] => docs.spec_file = value.to_string(),
            ["DOCS", "TITLE"] => docs.title = value.to_string(),
            ["DOCS", "DESCRIPTION"] => docs.description = non_empty(value),
            ["DOCS", "VERSION"] => docs.version = value.to_string(),
            ["DOCS", "TERMS_OF_SERVICE"] => docs.terms_of_service = non_empty(value),

            ["LOGGING", "ENABLED"] => logging.enabled = parse_flag(key, value)?,
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env_parse_error(key, "expected 'json' or 'pretty'")),
                };
            }
            ["LOGGING", "ANSI"] => logging.ansi = parse_flag(key, value)?,

            _ => {}
        }
        Ok(())
    }
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
