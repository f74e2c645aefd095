//! Request binding.
//!
//! A request type hands its field metadata to the router once, at
//! registration, and gets back a [`RequestDescriptor`]. Per request,
//! [`bind_request`] walks that descriptor: parameters are read from the path,
//! query, headers and cookies, the body is decoded by content type, and the
//! populated value is passed to the validator.

use lite_core::{FieldDescriptor, HttpError, Location, RawField, RequestDescriptor, TypeShape};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::body::decode_body;
use crate::param::ParamDeserializer;
use crate::validate::{RequestValidator, Validate};
use crate::{ExtractionContext, ExtractionError, ExtractionSource};

/// A type that can be bound from an HTTP request.
///
/// Usually derived with `#[derive(LiteRequest)]`; `String` and `Vec<u8>` bind
/// the raw body directly.
pub trait LiteRequest: Sized + Send + 'static {
    /// Raw field metadata, in declaration order.
    fn fields() -> Vec<RawField>;

    /// Builds a value from the request.
    fn bind(cx: &ExtractionContext, desc: &RequestDescriptor) -> Result<Self, HttpError>;

    /// The value as seen by the validator, if the type opts in.
    fn validatable(&self) -> Option<&dyn Validate> {
        None
    }
}

/// Compiles the descriptor of a request type.
pub fn describe_request<T: LiteRequest>() -> Result<RequestDescriptor, lite_core::RegistrationError> {
    RequestDescriptor::compile(T::fields())
}

/// Binds a request and runs the validator.
pub fn bind_request<T: LiteRequest>(
    cx: &ExtractionContext,
    desc: &RequestDescriptor,
    validator: Option<&dyn RequestValidator>,
) -> Result<T, HttpError> {
    let value = T::bind(cx, desc).map_err(|e| {
        debug!(path = cx.path(), error = %e, "request binding failed");
        e
    })?;

    if let (Some(validator), Some(target)) = (validator, value.validatable()) {
        validator
            .validate(target)
            .map_err(HttpError::constraint_violations)?;
    }
    Ok(value)
}

/// Binds one annotated field. Called by generated [`LiteRequest::bind`] code.
pub fn bind_field<T: DeserializeOwned>(
    cx: &ExtractionContext,
    field: &FieldDescriptor,
) -> Result<T, HttpError> {
    let (source, name, deserializer) = match &field.location {
        Location::Path { name } => {
            let raw = cx
                .path_params()
                .get(name)
                .ok_or_else(|| ExtractionError::MissingPathParameter(name.clone()))?;
            let value = percent_decode_str(raw).decode_utf8().map_err(|e| {
                ExtractionError::invalid_value(ExtractionSource::Path, name.as_str(), e)
            })?;
            return T::deserialize(ParamDeserializer::new(Some(value.as_ref())).with_shape(&field.shape))
                .map_err(|e| {
                    ExtractionError::invalid_value(ExtractionSource::Path, name.as_str(), e).into()
                });
        }
        Location::Query { name } => {
            let deserializer = if matches!(field.shape.unwrap_optional(), TypeShape::Seq(_)) {
                ParamDeserializer::many(cx.query_all(name))
            } else {
                ParamDeserializer::new(cx.query(name))
            };
            (ExtractionSource::Query, name, deserializer)
        }
        Location::Header { name, .. } => (
            ExtractionSource::Header,
            name,
            ParamDeserializer::new(cx.header(name)),
        ),
        Location::Cookie { name } => (
            ExtractionSource::Cookie,
            name,
            ParamDeserializer::new(cx.cookie(name)),
        ),
        Location::Body { .. } => return Ok(decode_body(cx, field)?),
        Location::Embedded(_) => {
            return Err(HttpError::internal(format!(
                "field `{}` is an embedded request and cannot be bound as a value",
                field.ident
            )))
        }
    };

    T::deserialize(deserializer.with_shape(&field.shape))
        .map_err(|e| ExtractionError::invalid_value(source, name.as_str(), e).into())
}

impl LiteRequest for String {
    fn fields() -> Vec<RawField> {
        vec![RawField::tagged("body", "req=body,text/plain", TypeShape::String)]
    }

    fn bind(cx: &ExtractionContext, desc: &RequestDescriptor) -> Result<Self, HttpError> {
        bind_field(cx, desc.field(0)?)
    }
}

impl LiteRequest for Vec<u8> {
    fn fields() -> Vec<RawField> {
        vec![RawField::tagged(
            "body",
            "req=body,application/octet-stream",
            TypeShape::Bytes,
        )]
    }

    fn bind(cx: &ExtractionContext, desc: &RequestDescriptor) -> Result<Self, HttpError> {
        bind_field(cx, desc.field(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractionContextBuilder;
    use http::Uri;
    use lite_core::Describe;

    fn field(tag: &'static str, shape: TypeShape) -> FieldDescriptor {
        RequestDescriptor::compile(vec![RawField::tagged("f", tag, shape)])
            .unwrap()
            .fields()[0]
            .clone()
    }

    fn cx() -> ExtractionContext {
        ExtractionContextBuilder::new()
            .uri(Uri::from_static("/pets/7?tag=a&tag=b&limit=20&empty="))
            .path_param("id", "7")
            .header("x-request-source", "mobile")
            .header("cookie", "session=s1")
            .build()
    }

    #[test]
    fn reads_every_location() {
        let cx = cx();
        assert_eq!(bind_field::<u64>(&cx, &field("path=id", u64::shape())).unwrap(), 7);
        assert_eq!(
            bind_field::<u32>(&cx, &field("query=limit", u32::shape())).unwrap(),
            20
        );
        assert_eq!(
            bind_field::<Vec<String>>(&cx, &field("query=tag", Vec::<String>::shape())).unwrap(),
            vec!["a", "b"]
        );
        assert_eq!(
            bind_field::<String>(&cx, &field("header=X-Request-Source", String::shape())).unwrap(),
            "mobile"
        );
        assert_eq!(
            bind_field::<Option<String>>(&cx, &field("cookie=session", Option::<String>::shape()))
                .unwrap()
                .as_deref(),
            Some("s1")
        );
    }

    #[test]
    fn absent_values_are_zero() {
        let cx = cx();
        assert_eq!(bind_field::<u32>(&cx, &field("query=empty", u32::shape())).unwrap(), 0);
        assert_eq!(
            bind_field::<Option<u32>>(&cx, &field("query=page", Option::<u32>::shape())).unwrap(),
            None
        );
        assert_eq!(
            bind_field::<String>(&cx, &field("header=x-missing", String::shape())).unwrap(),
            ""
        );
    }

    #[test]
    fn path_segments_are_percent_decoded() {
        let cx = ExtractionContextBuilder::new()
            .uri(Uri::from_static("/pets/hello%20w%C3%B6rld"))
            .path_param("name", "hello%20w%C3%B6rld")
            .build();
        assert_eq!(
            bind_field::<String>(&cx, &field("path=name", String::shape())).unwrap(),
            "hello wörld"
        );

        let cx = ExtractionContextBuilder::new()
            .uri(Uri::from_static("/pets/%FF"))
            .path_param("name", "%FF")
            .build();
        let err = bind_field::<String>(&cx, &field("path=name", String::shape())).unwrap_err();
        assert_eq!(err.status, 400);
        assert!(err.description.contains("path parameter `name`"));
    }

    #[test]
    fn missing_path_parameter_is_a_bad_request() {
        let err = bind_field::<u64>(&cx(), &field("path=other", u64::shape())).unwrap_err();
        assert_eq!(err.status, 400);
        assert!(err.description.contains("missing path parameter"));
    }

    #[test]
    fn conversion_failures_name_the_parameter() {
        let cx = ExtractionContextBuilder::new()
            .uri(Uri::from_static("/?limit=300"))
            .build();
        let err = bind_field::<u8>(&cx, &field("query=limit", u8::shape())).unwrap_err();
        assert_eq!(err.status, 400);
        assert!(err.description.contains("query parameter `limit`"));
    }

    #[test]
    fn raw_string_and_bytes_requests() {
        let desc = describe_request::<String>().unwrap();
        let cx = ExtractionContextBuilder::new()
            .header("content-type", "text/plain")
            .body("hi")
            .build();
        let text: String = bind_request(&cx, &desc, None).unwrap();
        assert_eq!(text, "hi");

        let desc = describe_request::<Vec<u8>>().unwrap();
        let cx = ExtractionContextBuilder::new()
            .header("content-type", "application/octet-stream")
            .body(vec![0_u8, 255])
            .build();
        let raw: Vec<u8> = bind_request(&cx, &desc, None).unwrap();
        assert_eq!(raw, vec![0, 255]);
    }
}
