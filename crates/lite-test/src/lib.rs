//! # Lite Test
//!
//! In-memory testing for lite applications. A [`TestClient`] freezes an
//! [`App`](lite_server::App) and calls its dispatch path directly, so tests
//! exercise routing, middleware, request binding and response encoding
//! without binding a port.
//!
//! ```rust
//! use lite_server::{App, ContextNoRequest};
//! use lite_test::TestClient;
//!
//! async fn hello(cx: ContextNoRequest) -> Result<String, std::convert::Infallible> {
//!     Ok(format!("hello {}", cx.query("name").unwrap_or("world")))
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut app = App::new();
//! app.get("/hello", hello);
//! let client = TestClient::new(app).unwrap();
//!
//! let response = client.get("/hello?name=lite").send().await;
//! response.assert_status(http::StatusCode::OK);
//! assert_eq!(response.json::<String>().unwrap(), "hello lite");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/lite-test/0.1.0")]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{MultipartForm, TestRequest, TestRequestBuilder};
pub use response::TestResponse;
