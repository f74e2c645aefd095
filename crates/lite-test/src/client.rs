//! In-memory client driving a frozen app.

use bytes::Bytes;
use http::Method;
use lite_server::{App, LiteService};
use serde::Serialize;

use crate::error::TestError;
use crate::request::{MultipartForm, TestRequest, TestRequestBuilder};
use crate::response::TestResponse;

/// Sends requests through an app's full dispatch path without a socket:
/// routing, middleware, binding, validation and serialization all run.
///
/// ```rust
/// use lite_server::{App, ContextNoRequest};
/// use lite_test::TestClient;
///
/// async fn ping(_cx: ContextNoRequest) -> Result<String, std::convert::Infallible> {
///     Ok("pong".to_string())
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut app = App::new();
/// app.get("/ping", ping);
/// let client = TestClient::new(app).unwrap();
///
/// let response = client.get("/ping").send().await;
/// assert_eq!(response.status_code(), 200);
/// assert_eq!(response.json::<String>().unwrap(), "pong");
/// # });
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    service: LiteService,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Freezes `app` and wraps it.
    pub fn new(app: App) -> Result<Self, TestError> {
        Ok(Self::from_service(app.into_service()?))
    }

    /// Wraps an already frozen service.
    pub fn from_service(service: LiteService) -> Self {
        Self {
            service,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a PATCH request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a HEAD request.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::HEAD, uri)
    }

    /// Starts an OPTIONS request.
    pub fn options(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::OPTIONS, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let mut builder = TestRequestBuilder::new(method, uri);
        for (name, value) in &self.default_headers {
            builder = builder.header(name, value);
        }
        TestClientRequest {
            client: self,
            builder,
        }
    }

    /// Sends a built request.
    pub async fn send(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let response = self.service.handle(request.into_http_request()).await;
        TestResponse::from_http(response).await
    }
}

/// A request builder bound to a [`TestClient`].
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Appends a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets `Authorization: Bearer <token>`.
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_token(token);
        self
    }

    /// Adds a cookie.
    pub fn cookie(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.cookie(name, value);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets a urlencoded form body.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Sets a multipart body.
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.builder = self.builder.multipart(form);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(err) => panic!("test request failed: {err}"),
        }
    }

    /// Sends the request, returning build and read errors.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.send(request).await
    }
}
