//! Test client errors.

use thiserror::Error;

/// Errors raised while building a request or reading a response.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request could not be built.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// A header name or value is invalid.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The app could not be turned into a service.
    #[error("app error: {0}")]
    App(#[from] lite_server::ServerError),

    /// The response body could not be read or is not UTF-8.
    #[error("body read error: {0}")]
    BodyRead(String),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML decoding failed.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Form encoding failed.
    #[error("form error: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),
}
