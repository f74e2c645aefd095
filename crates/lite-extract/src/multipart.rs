//! Multipart form data.
//!
//! Bodies are buffered, so the parts are read eagerly with `multer` and kept
//! on the [`ExtractionContext`](crate::ExtractionContext). The binder then
//! maps them onto the body struct like a URL-encoded form, with file parts
//! available as [`UploadedFile`] values.

use std::io;

use bytes::Bytes;
use lite_core::{Describe, TypeShape};
use serde::{Deserialize, Serialize};

use crate::ExtractionError;

/// Default maximum total body size for multipart (10 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Default maximum number of parts.
pub const DEFAULT_MAX_FIELDS: usize = 100;

/// Configuration for multipart parsing.
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Maximum total body size in bytes.
    pub max_body_size: usize,
    /// Maximum size per part in bytes.
    pub max_field_size: usize,
    /// Maximum number of parts allowed.
    pub max_fields: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_field_size: DEFAULT_MAX_BODY_SIZE,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

impl MultipartConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum body size.
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Set the maximum part size.
    #[must_use]
    pub fn max_field_size(mut self, size: usize) -> Self {
        self.max_field_size = size;
        self
    }

    /// Set the maximum number of parts.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }
}

/// One buffered part of a multipart body.
#[derive(Debug, Clone)]
pub struct Part {
    /// Form field name.
    pub name: String,
    /// Client-side file name, present for file parts.
    pub file_name: Option<String>,
    /// Declared content type of the part.
    pub content_type: Option<String>,
    /// Part contents.
    pub data: Bytes,
}

impl Part {
    /// Returns true if the part was sent as a file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.file_name.is_some()
    }
}

/// A file received in a multipart body.
///
/// Use it as a body field type to receive the upload together with its
/// metadata; plain `Vec<u8>` or `String` fields receive only the contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Form field name.
    pub field_name: String,
    /// Client-side file name.
    pub file_name: Option<String>,
    /// Declared content type.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

impl UploadedFile {
    /// Size of the contents in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Describe for UploadedFile {
    fn shape() -> TypeShape {
        TypeShape::File
    }
}

/// Reads every part of a multipart body.
pub async fn read_parts(
    content_type: &str,
    body: Bytes,
    config: &MultipartConfig,
) -> Result<Vec<Part>, ExtractionError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| ExtractionError::Multipart(e.to_string()))?;

    if body.len() > config.max_body_size {
        return Err(ExtractionError::PayloadTooLarge {
            max: config.max_body_size,
            actual: body.len(),
        });
    }

    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ExtractionError::Multipart(e.to_string()))?
    {
        if parts.len() >= config.max_fields {
            return Err(ExtractionError::TooManyFields(config.max_fields));
        }
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let part_type = field.content_type().map(ToString::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ExtractionError::Multipart(e.to_string()))?;
        if data.len() > config.max_field_size {
            return Err(ExtractionError::PayloadTooLarge {
                max: config.max_field_size,
                actual: data.len(),
            });
        }
        parts.push(Part {
            name,
            file_name,
            content_type: part_type,
            data,
        });
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "X-BOUNDARY";

    fn body() -> Bytes {
        Bytes::from(
            "--X-BOUNDARY\r\n\
             Content-Disposition: form-data; name=\"title\"\r\n\r\n\
             holiday\r\n\
             --X-BOUNDARY\r\n\
             Content-Disposition: form-data; name=\"photo\"; filename=\"beach.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             PNGDATA\r\n\
             --X-BOUNDARY--\r\n",
        )
    }

    fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    #[tokio::test]
    async fn reads_value_and_file_parts() {
        let parts = read_parts(&content_type(), body(), &MultipartConfig::default())
            .await
            .unwrap();
        assert_eq!(parts.len(), 2);

        assert_eq!(parts[0].name, "title");
        assert!(!parts[0].is_file());
        assert_eq!(parts[0].data, Bytes::from_static(b"holiday"));

        assert_eq!(parts[1].name, "photo");
        assert_eq!(parts[1].file_name.as_deref(), Some("beach.png"));
        assert_eq!(parts[1].content_type.as_deref(), Some("image/png"));
        assert_eq!(parts[1].data, Bytes::from_static(b"PNGDATA"));
    }

    #[tokio::test]
    async fn enforces_limits() {
        let err = read_parts(&content_type(), body(), &MultipartConfig::new().max_fields(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::TooManyFields(1)));

        let err = read_parts(&content_type(), body(), &MultipartConfig::new().max_body_size(8))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::PayloadTooLarge { max: 8, .. }));
    }

    #[tokio::test]
    async fn missing_boundary() {
        let err = read_parts("multipart/form-data", body(), &MultipartConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Multipart(_)));
    }
}
