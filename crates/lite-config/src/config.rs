//! Root configuration type.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, DocsSection, LoggingSection, ServerSection};

/// Complete configuration of a lite app.
///
/// ```
/// use lite_config::LiteConfig;
///
/// let config = LiteConfig::default();
/// assert_eq!(config.server.addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LiteConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSection,

    /// OpenAPI document and Swagger UI settings.
    #[serde(default)]
    pub docs: DocsSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl LiteConfig {
    /// Checks values serde cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.addr",
                format!("invalid socket address: {}", self.server.addr),
            ));
        }

        for (field, url) in [
            ("docs.swagger_url", &self.docs.swagger_url),
            ("docs.yaml_url", &self.docs.yaml_url),
        ] {
            if !url.starts_with('/') {
                return Err(ConfigError::invalid_value(field, "must start with '/'"));
            }
        }
        if self.docs.swagger_url == self.docs.yaml_url {
            return Err(ConfigError::validation_error(
                "docs.swagger_url and docs.yaml_url must differ",
            ));
        }

        if self.docs.spec_file.trim().is_empty() && !self.docs.disable_local_save {
            return Err(ConfigError::invalid_value("docs.spec_file", "must not be empty"));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        // a bare word is a level, anything else is a filter directive
        let level = &self.logging.level;
        let is_directive = level.contains('=') || level.contains(',');
        if !is_directive && !lite_telemetry::is_known_level(level) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown level: {level}"),
            ));
        }
        if is_directive {
            lite_telemetry::create_env_filter(level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(LiteConfig::default().validate().is_ok());
    }

    #[test]
    fn invalid_address() {
        let mut config = LiteConfig::default();
        config.server.addr = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.addr"));
    }

    #[test]
    fn urls_must_be_absolute_paths() {
        let mut config = LiteConfig::default();
        config.docs.swagger_url = "swagger".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "docs.swagger_url"
        ));

        let mut config = LiteConfig::default();
        config.docs.yaml_url = config.docs.swagger_url.clone();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn levels_and_directives() {
        let mut config = LiteConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "lite_server=debug,info".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn body_limit_must_be_positive() {
        let mut config = LiteConfig::default();
        config.server.max_body_bytes = 0;
        assert!(config.validate().is_err());
    }
}
