//! Handler contexts.
//!
//! A handler receives either a [`Context<T>`] carrying its bound request, or
//! a [`ContextNoRequest`] when the route has no request type. Both give read
//! access to the raw request and let the handler shape the response: status,
//! content type and extra headers.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use http::header::HeaderName;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use lite_core::HttpError;
use lite_extract::ExtractionContext;
use lite_router::Params;
use parking_lot::Mutex;

/// Id assigned to a request, stored in its extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub(crate) String);

impl RequestId {
    /// The id as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Response settings a handler may change. Shared with the adapter, which
/// reads them back once the handler returns.
#[derive(Debug, Clone)]
pub(crate) struct ResponseParts {
    pub(crate) status: StatusCode,
    pub(crate) content_type: String,
    pub(crate) headers: HeaderMap,
}

/// Context of a handler without a request type.
#[derive(Debug)]
pub struct ContextNoRequest {
    request: ExtractionContext,
    request_id: String,
    response: Arc<Mutex<ResponseParts>>,
}

impl ContextNoRequest {
    pub(crate) fn new(
        request: ExtractionContext,
        request_id: String,
        response: Arc<Mutex<ResponseParts>>,
    ) -> Self {
        Self {
            request,
            request_id,
            response,
        }
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// Parameters captured from the route template.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        self.request.path_params()
    }

    /// First query value for `name`.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.request.query(name)
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// A header as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    /// A cookie value.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.request.cookie(name)
    }

    /// Raw request data, including the body.
    #[must_use]
    pub fn raw(&self) -> &ExtractionContext {
        &self.request
    }

    /// Id of this request, also sent back as `x-request-id`.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Content type the response will be serialized with.
    #[must_use]
    pub fn content_type(&self) -> String {
        self.response.lock().content_type.clone()
    }

    /// Changes the response content type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.response.lock().content_type = content_type.into();
    }

    /// Status of a successful response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.response.lock().status
    }

    /// Overrides the success status derived from the method.
    pub fn set_status(&mut self, status: StatusCode) {
        self.response.lock().status = status;
    }

    /// Adds a header to the response, replacing an existing value.
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.lock().headers.insert(name, value);
    }
}

/// Context of a handler with a bound request of type `T`.
///
/// Dereferences to [`ContextNoRequest`] for everything but the request.
#[derive(Debug)]
pub struct Context<T> {
    request: Option<T>,
    inner: ContextNoRequest,
}

impl<T> Context<T> {
    pub(crate) fn new(request: T, inner: ContextNoRequest) -> Self {
        Self {
            request: Some(request),
            inner,
        }
    }

    /// Takes the bound request. It can be taken once.
    pub fn requests(&mut self) -> Result<T, HttpError> {
        self.request
            .take()
            .ok_or_else(|| HttpError::internal("the request has already been taken"))
    }

    /// Borrows the bound request, if it has not been taken.
    #[must_use]
    pub fn request(&self) -> Option<&T> {
        self.request.as_ref()
    }
}

impl<T> Deref for Context<T> {
    type Target = ContextNoRequest;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> DerefMut for Context<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lite_extract::ExtractionContextBuilder;

    fn parts() -> Arc<Mutex<ResponseParts>> {
        Arc::new(Mutex::new(ResponseParts {
            status: StatusCode::OK,
            content_type: "application/json".to_string(),
            headers: HeaderMap::new(),
        }))
    }

    fn inner(response: Arc<Mutex<ResponseParts>>) -> ContextNoRequest {
        let request = ExtractionContextBuilder::new()
            .method(Method::GET)
            .uri(http::Uri::from_static("/foo/7?q=x"))
            .header("cookie", "session=abc")
            .path_param("id", "7")
            .build();
        ContextNoRequest::new(request, "req-1".to_string(), response)
    }

    #[test]
    fn request_is_taken_once() {
        let mut cx = Context::new(42_u32, inner(parts()));
        assert_eq!(cx.request(), Some(&42));
        assert_eq!(cx.requests().unwrap(), 42);
        assert!(cx.request().is_none());
        assert_eq!(cx.requests().unwrap_err().status, 500);
    }

    #[test]
    fn exposes_the_raw_request() {
        let cx = Context::new((), inner(parts()));
        assert_eq!(cx.method(), Method::GET);
        assert_eq!(cx.path(), "/foo/7");
        assert_eq!(cx.path_params().get("id"), Some("7"));
        assert_eq!(cx.query("q"), Some("x"));
        assert_eq!(cx.cookie("session"), Some("abc"));
        assert_eq!(cx.request_id(), "req-1");
    }

    #[test]
    fn response_changes_are_shared() {
        let response = parts();
        let mut cx = inner(response.clone());
        cx.set_status(StatusCode::ACCEPTED);
        cx.set_content_type("application/xml");
        cx.insert_header(HeaderName::from_static("x-extra"), HeaderValue::from_static("1"));

        let parts = response.lock();
        assert_eq!(parts.status, StatusCode::ACCEPTED);
        assert_eq!(parts.content_type, "application/xml");
        assert_eq!(parts.headers["x-extra"], "1");
        drop(parts);
        assert_eq!(cx.content_type(), "application/xml");
        assert_eq!(cx.status(), StatusCode::ACCEPTED);
    }
}
