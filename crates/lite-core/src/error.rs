//! HTTP error model.
//!
//! [`HttpError`] is both the error value returned by the binder, validator
//! and handlers, and the body written back to the client. Every operation in
//! the generated OpenAPI document references its shared `httpGenericError`
//! schema for the default error responses.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::shape::{Describe, FieldShape, StructShape, TypeShape};

/// Schema name of [`HttpError`].
pub const HTTP_ERROR_SCHEMA: &str = "httpGenericError";

/// Context of errors caused by a malformed request (path, query, body...).
pub const REQUEST_BODY_ERROR_CONTEXT: &str = "/api/contexts/RequestBodyError";

/// Context of errors caused by validation rule failures.
pub const CONSTRAINT_VIOLATION_CONTEXT: &str = "/api/contexts/ConstraintViolationList";

/// Result type alias using [`HttpError`].
pub type HttpResult<T> = Result<T, HttpError>;

/// Structured HTTP error.
///
/// ```
/// use lite_core::HttpError;
///
/// let err = HttpError::not_found("no pet with id 7");
/// assert_eq!(err.status, 404);
/// assert_eq!(err.to_string(), "Not Found [404]: no pet with id 7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{title} [{status}]: {description}")]
#[serde(rename = "httpGenericError", rename_all = "camelCase")]
pub struct HttpError {
    /// Unique id, useful to correlate a response with log lines.
    pub id: Uuid,
    /// HTTP status code.
    pub status: u16,
    /// Short title, the canonical reason phrase by default.
    pub title: String,
    /// Human readable description.
    pub description: String,
    /// RFC 7807 style context URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// RFC 7807 style problem type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Property-level failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

/// One property-level failure inside an [`HttpError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Unique id of this violation.
    pub id: Uuid,
    /// Dotted path of the offending property.
    pub property_path: String,
    /// Human readable message.
    pub message: String,
    /// Machine readable rule code.
    pub code: String,
}

impl Violation {
    /// Creates a violation with a fresh id.
    pub fn new(
        property_path: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            property_path: property_path.into(),
            message: message.into(),
            code: code.into(),
        }
    }
}

impl HttpError {
    /// Creates an error with the canonical title of `status`.
    pub fn new(status: StatusCode, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            status: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            description: description.into(),
            context: None,
            kind: None,
            violations: Vec::new(),
        }
    }

    /// 400 Bad Request.
    pub fn bad_request(description: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, description)
    }

    /// 401 Unauthorized.
    pub fn unauthorized(description: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, description)
    }

    /// 403 Forbidden.
    pub fn forbidden(description: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, description)
    }

    /// 404 Not Found.
    pub fn not_found(description: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, description)
    }

    /// 409 Conflict.
    pub fn conflict(description: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, description)
    }

    /// 500 Internal Server Error.
    pub fn internal(description: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, description)
    }

    /// 503 Service Unavailable.
    pub fn service_unavailable(description: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, description)
    }

    /// 400 for a request whose shape could not be read.
    pub fn request_body(description: impl Into<String>) -> Self {
        Self::bad_request(description).with_context(REQUEST_BODY_ERROR_CONTEXT)
    }

    /// 400 carrying validation failures.
    pub fn constraint_violations(violations: Vec<Violation>) -> Self {
        let description = match violations.len() {
            1 => "1 constraint violation".to_string(),
            n => format!("{n} constraint violations"),
        };
        Self {
            violations,
            ..Self::bad_request(description).with_context(CONSTRAINT_VIOLATION_CONTEXT)
        }
    }

    /// Sets the context URI.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Sets the problem type.
    #[must_use]
    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Overrides the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Appends a violation.
    #[must_use]
    pub fn with_violation(mut self, violation: Violation) -> Self {
        self.violations.push(violation);
        self
    }

    /// Status as [`StatusCode`], falling back to 500 for out-of-range values.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl Describe for Violation {
    fn shape() -> TypeShape {
        TypeShape::Struct(StructShape::new("violation", || {
            vec![
                FieldShape::new("id", TypeShape::String),
                FieldShape::new("propertyPath", TypeShape::String),
                FieldShape::new("message", TypeShape::String),
                FieldShape::new("code", TypeShape::String),
            ]
        }))
    }
}

impl Describe for HttpError {
    fn shape() -> TypeShape {
        TypeShape::Struct(StructShape::new(HTTP_ERROR_SCHEMA, || {
            vec![
                FieldShape::new("id", TypeShape::String),
                FieldShape::new("status", u16::shape()),
                FieldShape::new("title", TypeShape::String),
                FieldShape::new("description", TypeShape::String),
                FieldShape::new("context", Option::<String>::shape()),
                FieldShape::new("type", Option::<String>::shape()),
                FieldShape::new("violations", Option::<Vec<Violation>>::shape()),
            ]
        }))
    }
}
