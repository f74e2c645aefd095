//! Test response wrapper.

use std::fmt;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

use crate::error::TestError;

/// A fully read response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Reads an `http::Response` to the end.
    pub async fn from_http<B>(response: http::Response<B>) -> Result<Self, TestError>
    where
        B: http_body_util::BodyExt,
        B::Error: fmt::Display,
    {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();
        Ok(Self::new(parts.status, parts.headers, body))
    }

    /// Builds a response from parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Status as a number.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// A header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// The `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Raw body.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid utf-8: {e}")))
    }

    /// Body decoded as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body decoded as YAML.
    pub fn yaml<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_yaml::from_slice(&self.body)?)
    }

    /// Asserts the status.
    ///
    /// # Panics
    ///
    /// Panics with the body if the status differs.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} with body {}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts a header value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("header `{name}` not found"));
        assert_eq!(actual, expected.as_ref(), "header `{name}`");
        self
    }

    /// Asserts the content type, ignoring parameters.
    ///
    /// # Panics
    ///
    /// Panics if the content type is missing or differs.
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let actual = self
            .content_type()
            .unwrap_or_else(|| panic!("no content type, expected `{expected}`"));
        assert!(
            actual.starts_with(expected),
            "content type: expected `{expected}`, got `{actual}`"
        );
        self
    }

    /// Asserts the body contains `expected`.
    ///
    /// # Panics
    ///
    /// Panics if it does not.
    pub fn assert_body_contains(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let body = String::from_utf8_lossy(&self.body);
        assert!(body.contains(expected), "body should contain `{expected}`, got: {body}");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    fn response(status: StatusCode, content_type: &'static str, body: &'static str) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        TestResponse::new(status, headers, Bytes::from_static(body.as_bytes()))
    }

    #[tokio::test]
    async fn reads_http_responses() {
        let http = http::Response::builder()
            .status(StatusCode::CREATED)
            .header("x-request-id", "abc")
            .body(Full::new(Bytes::from_static(b"{\"id\":1}")))
            .unwrap();
        let response = TestResponse::from_http(http).await.unwrap();

        assert_eq!(response.status_code(), 201);
        assert_eq!(response.header_str("x-request-id"), Some("abc"));
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn decodes_and_asserts() {
        let response = response(StatusCode::OK, "application/yaml", "openapi: 3.0.3\n");
        let doc: serde_yaml::Value = response.yaml().unwrap();
        assert_eq!(doc["openapi"].as_str(), Some("3.0.3"));
        response
            .assert_status(StatusCode::OK)
            .assert_content_type("application/yaml")
            .assert_body_contains("3.0.3");
        assert_eq!(response.text().unwrap(), "openapi: 3.0.3\n");
    }

    #[test]
    #[should_panic(expected = "expected status 404")]
    fn status_mismatch_panics() {
        response(StatusCode::OK, "text/plain", "ok").assert_status(StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let response = response(StatusCode::OK, "text/plain", "nope");
        assert!(matches!(
            response.json::<serde_json::Value>(),
            Err(TestError::Json(_))
        ));
    }
}
