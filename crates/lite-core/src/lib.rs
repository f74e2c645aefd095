//! # Lite Core
//!
//! Core types shared by the lite crates.
//!
//! - [`HttpError`] - structured error, also the wire body of every error response
//! - [`TypeShape`] / [`Describe`] - runtime description of request and response types
//! - [`Kind`] - binding class derived from a shape
//! - [`tag`] - the `LOCATION=NAME[,flags]` field annotation grammar
//! - [`RequestDescriptor`] - compiled, validated view of a request type
//! - [`MediaTypes`] - content-type prefix registry

#![doc(html_root_url = "https://docs.rs/lite-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod descriptor;
mod error;
pub mod kind;
pub mod media;
pub mod shape;
pub mod tag;

pub use descriptor::{
    AuthScheme, FieldDescriptor, Location, RawField, RegistrationError, RequestDescriptor,
};
pub use error::{
    HttpError, HttpResult, Violation, CONSTRAINT_VIOLATION_CONTEXT, HTTP_ERROR_SCHEMA,
    REQUEST_BODY_ERROR_CONTEXT,
};
pub use kind::{classify, Kind};
pub use media::{MediaFamily, MediaTypes};
pub use shape::{dive_name, Describe, FieldShape, StructShape, TypeShape};
