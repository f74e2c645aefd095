//! Media type registry.
//!
//! Both the request binder and the response serializer dispatch on a
//! [`MediaFamily`] looked up here. Matching is case-insensitive, ignores
//! parameters such as `; charset=utf-8`, and picks the longest registered
//! prefix, so `image/` covers every image subtype.

use std::fmt;

/// `application/json`
pub const APPLICATION_JSON: &str = "application/json";
/// `application/xml`
pub const APPLICATION_XML: &str = "application/xml";
/// `application/x-www-form-urlencoded`
pub const APPLICATION_FORM: &str = "application/x-www-form-urlencoded";
/// `multipart/form-data`
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
/// `text/plain`
pub const TEXT_PLAIN: &str = "text/plain";
/// `text/html`
pub const TEXT_HTML: &str = "text/html";
/// `application/octet-stream`
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";
/// `application/pdf`
pub const APPLICATION_PDF: &str = "application/pdf";
/// `application/zip`
pub const APPLICATION_ZIP: &str = "application/zip";

/// Codec family of a media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaFamily {
    /// JSON documents.
    Json,
    /// XML documents.
    Xml,
    /// URL-encoded forms.
    Form,
    /// Multipart forms.
    Multipart,
    /// Plain text and HTML.
    Text,
    /// Opaque bytes: octet-stream, PDF, ZIP, images, audio, video.
    Binary,
}

impl fmt::Display for MediaFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Form => "form",
            Self::Multipart => "multipart",
            Self::Text => "text",
            Self::Binary => "binary",
        })
    }
}

/// Returns the lowercased `type/subtype` part of a content type.
///
/// ```
/// assert_eq!(lite_core::media::essence("Application/JSON; charset=utf-8"), "application/json");
/// ```
#[must_use]
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Returns the value of a content-type parameter such as `boundary`.
#[must_use]
pub fn parameter<'a>(content_type: &'a str, name: &str) -> Option<&'a str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Registry of `prefix → family` entries.
#[derive(Debug, Clone)]
pub struct MediaTypes {
    entries: Vec<(String, MediaFamily)>,
}

impl Default for MediaTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaTypes {
    /// Creates a registry with the built-in entries.
    #[must_use]
    pub fn new() -> Self {
        let builtin = [
            (APPLICATION_JSON, MediaFamily::Json),
            (APPLICATION_XML, MediaFamily::Xml),
            ("text/xml", MediaFamily::Xml),
            (APPLICATION_FORM, MediaFamily::Form),
            (MULTIPART_FORM_DATA, MediaFamily::Multipart),
            (TEXT_PLAIN, MediaFamily::Text),
            (TEXT_HTML, MediaFamily::Text),
            (APPLICATION_OCTET_STREAM, MediaFamily::Binary),
            (APPLICATION_PDF, MediaFamily::Binary),
            (APPLICATION_ZIP, MediaFamily::Binary),
            ("image/", MediaFamily::Binary),
        ];
        Self {
            entries: builtin
                .into_iter()
                .map(|(prefix, family)| (prefix.to_string(), family))
                .collect(),
        }
    }

    /// Maps an additional prefix onto a family, replacing any existing entry.
    pub fn register(&mut self, prefix: impl AsRef<str>, family: MediaFamily) {
        let prefix = prefix.as_ref().trim().to_ascii_lowercase();
        self.entries.retain(|(p, _)| *p != prefix);
        self.entries.push((prefix, family));
    }

    /// Looks up the family of a content type.
    #[must_use]
    pub fn classify(&self, content_type: &str) -> Option<MediaFamily> {
        let essence = essence(content_type);
        self.entries
            .iter()
            .filter(|(prefix, _)| essence.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, family)| *family)
    }
}
