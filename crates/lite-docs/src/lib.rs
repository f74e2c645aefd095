//! # Lite Docs
//!
//! OpenAPI 3.0.3 derivation for the lite framework.
//!
//! Every route registered on an app is passed to [`OpenApiGenerator::register`],
//! which walks the request descriptor and the response shape and inserts one
//! operation into the document. Failures are registration errors: the route
//! is rejected before the server starts.
//!
//! The finished document is served as YAML next to a [`SwaggerUi`] page.
//!
//! ```rust
//! use http::Method;
//! use lite_core::{Describe, RawField, RequestDescriptor};
//! use lite_docs::{OpenApiGenerator, RouteDoc};
//!
//! let request = RequestDescriptor::compile(vec![RawField::tagged(
//!     "id",
//!     "path=id",
//!     u64::shape(),
//! )])
//! .unwrap();
//!
//! let mut generator = OpenApiGenerator::new().title("Pets");
//! generator
//!     .register(&RouteDoc {
//!         method: &Method::GET,
//!         template: "/pets/:id",
//!         canonical: "/pets/{id}",
//!         request: Some(&request),
//!         response: &String::shape(),
//!         response_content_type: "text/plain",
//!     })
//!     .unwrap();
//!
//! let doc = generator.document();
//! assert!(doc.components.parameters.contains_key("id"));
//! ```

#![doc(html_root_url = "https://docs.rs/lite-docs/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod generator;
pub mod openapi;
mod schema;
mod swagger;

pub use error::{DocsError, DocsResult};
pub use generator::{
    default_status, OpenApiGenerator, RouteDoc, DEFAULT_ERROR_STATUSES, ERROR_CONTENT_TYPES,
};
pub use openapi::{
    Contact, Info, License, MediaType, OpenApi, Operation, Parameter, ParameterIn, PathItem,
    RefOr, Reference, RequestBody, Response, Schema, SchemaType, SecurityScheme, Server, Tag,
};
pub use schema::SchemaGenerator;
pub use swagger::{DocExpansion, SwaggerUi, DEFAULT_SWAGGER_URL, DEFAULT_YAML_URL};
