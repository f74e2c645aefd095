//! Extraction error types.
//!
//! Failures to read a request are client errors, except an XML body that is
//! not a well-formed document, which is reported as a 500. [`ExtractionError`]
//! keeps enough detail for logs and converts into the [`HttpError`] that goes
//! on the wire.

use std::fmt;

use lite_core::{HttpError, Kind, MediaFamily, REQUEST_BODY_ERROR_CONTEXT};
use thiserror::Error;

/// Part of the request a value was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// A `:name` path segment.
    Path,
    /// The query string.
    Query,
    /// A request header.
    Header,
    /// A cookie.
    Cookie,
    /// The request body.
    Body,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
        })
    }
}

/// Failure to bind part of a request.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The route matched but the segment was not captured.
    #[error("missing path parameter `{0}`")]
    MissingPathParameter(String),

    /// A string value could not be converted to the field type.
    #[error("invalid {location} parameter `{name}`: {reason}")]
    InvalidValue {
        /// Where the value came from.
        location: ExtractionSource,
        /// External name of the parameter.
        name: String,
        /// Conversion failure.
        reason: String,
    },

    /// The request carries no `Content-Type` but a body is expected.
    #[error("missing content type")]
    MissingContentType,

    /// No codec is registered for the request's `Content-Type`.
    #[error("unsupported content type `{0}`")]
    UnsupportedMediaType(String),

    /// The body is not valid for its content type.
    #[error("invalid {family} body: {reason}")]
    Body {
        /// Codec family of the body.
        family: MediaFamily,
        /// Decoder error.
        reason: String,
    },

    /// An XML body is not a well-formed document.
    #[error("malformed xml document: {0}")]
    MalformedXml(String),

    /// The codec cannot produce a value of the field's kind.
    #[error("a {family} body cannot be bound to a {kind} field")]
    KindMismatch {
        /// Codec family of the body.
        family: MediaFamily,
        /// Kind of the target field.
        kind: Kind,
    },

    /// Multipart framing error.
    #[error("malformed multipart body: {0}")]
    Multipart(String),

    /// The body exceeds a configured limit.
    #[error("payload too large: max {max} bytes, got {actual} bytes")]
    PayloadTooLarge {
        /// Limit in bytes.
        max: usize,
        /// Observed size.
        actual: usize,
    },

    /// Too many multipart parts.
    #[error("too many multipart fields (max {0})")]
    TooManyFields(usize),
}

impl ExtractionError {
    /// Creates an [`ExtractionError::InvalidValue`].
    pub fn invalid_value(
        location: ExtractionSource,
        name: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        Self::InvalidValue {
            location,
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an [`ExtractionError::Body`].
    pub fn body(family: MediaFamily, reason: impl fmt::Display) -> Self {
        Self::Body {
            family,
            reason: reason.to_string(),
        }
    }

    /// Returns true for failures of the body rather than of a parameter.
    #[must_use]
    pub const fn is_body_error(&self) -> bool {
        !matches!(
            self,
            Self::MissingPathParameter(_) | Self::InvalidValue { .. }
        )
    }
}

impl From<ExtractionError> for HttpError {
    fn from(err: ExtractionError) -> Self {
        if matches!(err, ExtractionError::MalformedXml(_)) {
            Self::internal(err.to_string()).with_context(REQUEST_BODY_ERROR_CONTEXT)
        } else if err.is_body_error() {
            Self::request_body(err.to_string())
        } else {
            Self::bad_request(err.to_string())
        }
    }
}
