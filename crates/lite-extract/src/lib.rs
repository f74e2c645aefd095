//! # Lite Extract
//!
//! Request binding and response serialization for the lite HTTP framework.
//!
//! A request type describes its fields once, through [`LiteRequest::fields`].
//! At registration the router compiles them into a
//! [`RequestDescriptor`](lite_core::RequestDescriptor); per request,
//! [`bind_request`] fills a value from an [`ExtractionContext`]:
//!
//! | Location | Source | Conversion |
//! |---|---|---|
//! | `path=` | route parameters | [`ParamDeserializer`] |
//! | `query=` | first query value, every value for sequences | [`ParamDeserializer`] |
//! | `header=` | first header value | [`ParamDeserializer`] |
//! | `cookie=` | cookie value | [`ParamDeserializer`] |
//! | `req=body` | request body | codec picked from the live `Content-Type` |
//!
//! Absent parameters produce zero values: `0`, `false`, `""`, `None` or an
//! empty sequence. Bodies decode as JSON, XML, url-encoded forms, multipart
//! forms, text, or raw bytes.
//!
//! ## Example
//!
//! ```rust
//! use lite_extract::{bind_request, describe_request, ExtractionContextBuilder};
//! use http::Uri;
//!
//! let desc = describe_request::<String>().unwrap();
//! let cx = ExtractionContextBuilder::new()
//!     .uri(Uri::from_static("/echo"))
//!     .header("content-type", "text/plain")
//!     .body("hello")
//!     .build();
//!
//! let text: String = bind_request(&cx, &desc, None).unwrap();
//! assert_eq!(text, "hello");
//! ```
//!
//! Responses go the other way through [`serialize_response`].

#![doc(html_root_url = "https://docs.rs/lite-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod body;
mod context;
mod error;
mod form;
pub mod multipart;
pub mod param;
pub mod response;
pub mod validate;

pub use binder::{bind_field, bind_request, describe_request, LiteRequest};
pub use body::decode_body;
pub use context::{ExtractionContext, ExtractionContextBuilder};
pub use error::{ExtractionError, ExtractionSource};
pub use form::{FormNode, FormSource};
pub use multipart::{read_parts, MultipartConfig, Part, UploadedFile};
pub use param::{parse_bool, ParamDeserializer, ParamError};
pub use response::{serialize_error, serialize_response, SerializeError};
pub use validate::{DefaultValidator, RequestValidator, Validate};
