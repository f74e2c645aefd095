//! Errors raised while assembling a [`LiteConfig`](crate::LiteConfig).

use std::path::PathBuf;
use thiserror::Error;

/// Why a configuration layer could not be applied.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `with_file` was given a path that does not exist.
    #[error("config file {} does not exist", path.display())]
    FileNotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read config file {}", path.display())]
    ReadError {
        /// File that failed.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Only `.toml` and `.json` files are understood.
    #[error("config file {} is neither .toml nor .json", path.display())]
    UnsupportedFormat {
        /// Offending file.
        path: PathBuf,
    },

    /// A TOML layer is malformed or has unknown keys.
    #[error("invalid TOML config: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A JSON layer is malformed, has unknown keys, or the merged layers
    /// no longer fit the schema.
    #[error("invalid JSON config: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The `.env` file exists but cannot be parsed.
    #[error("invalid .env file: {0}")]
    Dotenv(String),

    /// A single setting has a value the server cannot use.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted path such as `docs.swagger_url`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `LITE__…` variable could not be mapped onto a setting.
    #[error("environment variable {var}: {reason}")]
    EnvParseError {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Settings that are fine alone but conflict with each other.
    #[error("inconsistent config: {0}")]
    ValidationError(String),
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_setting() {
        let err = ConfigError::invalid_value("docs.swagger_url", "must start with '/'");
        assert_eq!(err.to_string(), "docs.swagger_url: must start with '/'");

        let err = ConfigError::env_parse_error("LITE__SERVER__MAX_BODY_BYTES", "expected integer");
        assert_eq!(
            err.to_string(),
            "environment variable LITE__SERVER__MAX_BODY_BYTES: expected integer"
        );
    }

    #[test]
    fn file_errors_show_the_path() {
        let err = ConfigError::file_not_found("/etc/lite/lite.toml");
        assert_eq!(err.to_string(), "config file /etc/lite/lite.toml does not exist");

        let err = ConfigError::UnsupportedFormat {
            path: "lite.yaml".into(),
        };
        assert!(err.to_string().contains("lite.yaml"));
    }

    #[test]
    fn read_errors_keep_their_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::read_error("lite.toml", io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
