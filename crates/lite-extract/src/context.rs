//! Extraction context providing access to request data.
//!
//! The [`ExtractionContext`] owns one buffered request. Query pairs and
//! cookies are parsed once on construction; a multipart body is parsed by
//! [`ExtractionContext::load_multipart`] before binding, since the binder
//! itself is synchronous.

use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderMap, Method, Uri};
use lite_core::{MediaFamily, MediaTypes};
use lite_router::Params;

use crate::multipart::{read_parts, MultipartConfig, Part};
use crate::ExtractionError;

/// Context providing access to all parts of an HTTP request.
///
/// # Example
///
/// ```rust
/// use lite_extract::ExtractionContext;
/// use lite_router::Params;
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let mut params = Params::new();
/// params.push("id", "123");
///
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/foo/123?x=1&x=2"),
///     HeaderMap::new(),
///     Bytes::new(),
///     params,
/// );
///
/// assert_eq!(ctx.path_params().get("id"), Some("123"));
/// assert_eq!(ctx.query("x"), Some("1"));
/// assert_eq!(ctx.query_all("x"), vec!["1", "2"]);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
    query: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    parts: Vec<Part>,
    media: Arc<MediaTypes>,
}

impl ExtractionContext {
    /// Creates a context with the built-in media types.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
        path_params: Params,
    ) -> Self {
        let query = uri
            .query()
            .map(|q| {
                form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        let cookies = parse_cookies(&headers);
        Self {
            method,
            uri,
            headers,
            body,
            path_params,
            query,
            cookies,
            parts: Vec::new(),
            media: Arc::new(MediaTypes::new()),
        }
    }

    /// Replaces the media-type registry used to dispatch body codecs.
    #[must_use]
    pub fn with_media_types(mut self, media: Arc<MediaTypes>) -> Self {
        self.media = media;
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the buffered body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the captured path parameters.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Returns the decoded query pairs in request order.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value of a query key.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a query key.
    #[must_use]
    pub fn query_all(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// First value of a header, if it is valid text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Value of a cookie.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every cookie in header order.
    #[must_use]
    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    /// Returns the `Content-Type` header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the media-type registry.
    #[must_use]
    pub fn media_types(&self) -> &MediaTypes {
        &self.media
    }

    /// Codec family of the request body, if the content type is known.
    #[must_use]
    pub fn body_family(&self) -> Option<MediaFamily> {
        self.content_type().and_then(|ct| self.media.classify(ct))
    }

    /// Multipart parts loaded by [`ExtractionContext::load_multipart`].
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Parses a multipart body into parts. Does nothing for other bodies.
    pub async fn load_multipart(&mut self, config: &MultipartConfig) -> Result<(), ExtractionError> {
        if self.body_family() != Some(MediaFamily::Multipart) || !self.parts.is_empty() {
            return Ok(());
        }
        let content_type = self
            .content_type()
            .ok_or(ExtractionError::MissingContentType)?
            .to_string();
        self.parts = read_parts(&content_type, self.body.clone(), config).await?;
        Ok(())
    }
}

fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((
                name.to_string(),
                value.trim().trim_matches('"').to_string(),
            ))
        })
        .collect()
}

/// Builder for constructing an [`ExtractionContext`], mostly for tests.
#[derive(Debug, Default)]
pub struct ExtractionContextBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
}

impl ExtractionContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Adds a single header.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a captured path parameter.
    #[must_use]
    pub fn path_param(mut self, name: &str, value: &str) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> ExtractionContext {
        ExtractionContext::new(
            self.method.unwrap_or(Method::GET),
            self.uri.unwrap_or_else(|| Uri::from_static("/")),
            self.headers,
            self.body,
            self.path_params,
        )
    }
}
