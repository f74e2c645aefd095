//! Derive macros for lite request and response types.
//!
//! - `#[derive(Describe)]` reports the serde wire shape of a type so the
//!   binder and the OpenAPI emitter can walk it.
//! - `#[derive(LiteRequest)]` turns a struct whose fields carry
//!   `#[lite("LOCATION=NAME[,flags]")]` annotations into a bindable request.
//!
//! # Example
//!
//! ```rust,ignore
//! use lite::prelude::*;
//!
//! #[derive(Deserialize, Describe)]
//! struct Pet {
//!     name: String,
//! }
//!
//! #[derive(Describe, LiteRequest)]
//! struct UpdatePet {
//!     #[lite("path=id")]
//!     id: u64,
//!     #[lite("req=body,application/json")]
//!     body: Pet,
//! }
//! ```
//!
//! Generated code refers to `lite_core` and `lite_extract` by crate name, so
//! both must be dependencies of the deriving crate.

mod attrs;
mod describe;
mod request;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `lite_core::Describe`.
///
/// Honours serde's `rename`, `rename_all`, `flatten`, `skip` and
/// `transparent`. Unit-only enums describe as strings; newtype structs
/// describe as their inner type.
#[proc_macro_derive(Describe, attributes(serde))]
pub fn derive_describe(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    describe::expand_describe(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives `lite_extract::LiteRequest`.
///
/// Annotated fields are bound from their location; unannotated fields are
/// embedded request structs. Add `#[lite(validate)]` on the struct to run the
/// app's validator (the type must implement `validator::Validate`).
#[proc_macro_derive(LiteRequest, attributes(lite))]
pub fn derive_lite_request(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    request::expand_request(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
