//! # Lite Router
//!
//! Route matching for lite.
//!
//! - [`PathPattern`] compiles `:name` templates into anchored expressions and
//!   their OpenAPI `{name}` form
//! - [`Params`] holds the captured values
//! - [`Router`] is a method-keyed table tried in registration order

#![doc(html_root_url = "https://docs.rs/lite-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod params;
mod pattern;
mod router;

pub use params::Params;
pub use pattern::{PathPattern, PatternError};
pub use router::{RouteMatch, Router, RouterError};
