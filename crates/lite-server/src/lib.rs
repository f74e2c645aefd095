//! # Lite Server
//!
//! The runtime half of the lite framework.
//!
//! An [`App`] collects routes. Each route pairs a method and a path template
//! with an async handler taking a [`Context<T>`] (or a [`ContextNoRequest`])
//! and returning `Result<Resp, E>`. Registration compiles the request type,
//! checks it against the template and documents the route in the OpenAPI
//! document; a route that fails any of those steps is rejected.
//!
//! [`App::run`] saves the document, then serves the routes together with
//! the YAML document and a Swagger UI page.
//!
//! ```rust,no_run
//! use lite_server::{App, ContextNoRequest};
//!
//! async fn health(_cx: ContextNoRequest) -> Result<String, std::convert::Infallible> {
//!     Ok("ok".to_string())
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lite_server::ServerError> {
//!     let mut app = App::new().addr("127.0.0.1:8080");
//!     app.get("/health", health);
//!     app.run().await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/lite-server/0.1.0")]

mod app;
mod context;
mod error;
mod handler;
pub mod middleware;
mod server;
mod service;
pub mod shutdown;

pub use app::{App, Route, Settings, DEFAULT_ADDR, DEFAULT_SPEC_FILE};
pub use context::{Context, ContextNoRequest, RequestId};
pub use error::{ServerError, ServerResult};
pub use handler::{ErasedHandler, Handler, Invocation, Runtime};
pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next, Request, Response};
pub use server::serve;
pub use service::{LiteService, REQUEST_ID_HEADER};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
