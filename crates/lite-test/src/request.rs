//! Test request building.

use bytes::{BufMut, Bytes, BytesMut};
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use http_body_util::Full;
use serde::Serialize;

use crate::error::TestError;

/// A request ready to be sent by a [`TestClient`](crate::TestClient).
#[derive(Debug, Clone)]
pub struct TestRequest {
    /// HTTP method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl TestRequest {
    /// Starts a GET request.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, uri)
    }

    /// Converts the request into an `http::Request`.
    pub fn into_http_request(self) -> http::Request<Full<Bytes>> {
        let mut request = http::Request::new(Full::new(self.body));
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.headers_mut() = self.headers;
        request
    }
}

/// Fluent builder for [`TestRequest`].
///
/// Invalid headers or bodies are remembered and reported by
/// [`TestRequestBuilder::build`].
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    cookies: Vec<String>,
    body: Option<Bytes>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: None,
            error: None,
        }
    }

    fn fail(mut self, err: TestError) -> Self {
        self.error.get_or_insert(err);
        self
    }

    /// Appends a header. Repeated names keep every value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = match HeaderName::try_from(name.as_ref()) {
            Ok(name) => name,
            Err(e) => return self.fail(TestError::InvalidHeader(e.to_string())),
        };
        let value = match HeaderValue::try_from(value.as_ref()) {
            Ok(value) => value,
            Err(e) => return self.fail(TestError::InvalidHeader(e.to_string())),
        };
        self.headers.append(name, value);
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.headers.remove(header::CONTENT_TYPE);
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets `Authorization: Bearer <token>`.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Adds a cookie.
    pub fn cookie(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.cookies
            .push(format!("{}={}", name.as_ref(), value.as_ref()));
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON body and `Content-Type: application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Some(Bytes::from(bytes));
                self.content_type("application/json")
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Sets a urlencoded form body.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => {
                self.body = Some(Bytes::from(encoded));
                self.content_type("application/x-www-form-urlencoded")
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Sets a `multipart/form-data` body.
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        let content_type = form.content_type();
        self.body = Some(form.into_body());
        self.content_type(content_type)
    }

    /// Builds the request.
    pub fn build(mut self) -> Result<TestRequest, TestError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let uri: Uri = self
            .uri
            .parse()
            .map_err(|e| TestError::RequestBuild(format!("invalid uri `{}`: {e}", self.uri)))?;

        if !self.cookies.is_empty() {
            let value = HeaderValue::try_from(self.cookies.join("; "))
                .map_err(|e| TestError::InvalidHeader(e.to_string()))?;
            self.headers.insert(header::COOKIE, value);
        }

        Ok(TestRequest {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body.unwrap_or_default(),
        })
    }
}

const BOUNDARY: &str = "lite-test-boundary-7MA4YWxkTrZu0gW";

/// A `multipart/form-data` body.
///
/// ```rust
/// use lite_test::MultipartForm;
///
/// let form = MultipartForm::new()
///     .text("name", "Rex")
///     .file("photo", "rex.png", "image/png", vec![0x89, 0x50]);
/// assert!(form.content_type().starts_with("multipart/form-data; boundary="));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

#[derive(Debug, Clone)]
struct FormPart {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl MultipartForm {
    /// An empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            filename: None,
            content_type: None,
            data: Bytes::from(value.into()),
        });
        self
    }

    /// Adds a file field.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(FormPart {
            name: name.into(),
            filename: Some(filename.into()),
            content_type: Some(content_type.into()),
            data: data.into(),
        });
        self
    }

    /// Value of the `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    /// Encodes the form.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        let mut out = BytesMut::new();
        for part in self.parts {
            out.put_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
            if let Some(filename) = &part.filename {
                disposition.push_str(&format!("; filename=\"{filename}\""));
            }
            out.put_slice(disposition.as_bytes());
            out.put_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                out.put_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            out.put_slice(b"\r\n");
            out.put_slice(&part.data);
            out.put_slice(b"\r\n");
        }
        out.put_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        out.freeze()
    }
}
