//! Response serialization.
//!
//! The codec is picked from the response content type, which defaults to the
//! route's declared type unless the handler changed it.
//!
//! | Family | Accepted values | Encoding |
//! |---|---|---|
//! | `text/*` | strings | raw |
//! | JSON | anything serde can encode | `serde_json` |
//! | XML | anything serde can encode | `quick-xml`, root named after the struct |
//! | form, multipart | `map<string, string>` | url-encoded pairs |
//! | binary | byte sequences | raw |

use bytes::Bytes;
use lite_core::{media, Describe, HttpError, MediaFamily, MediaTypes, TypeShape};
use serde::Serialize;
use thiserror::Error;

/// Root element for XML values that are not structs.
pub const XML_ROOT: &str = "response";

/// Errors raised while encoding a response. All of them become a 500.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The response content type has no codec.
    #[error("unsupported response content type `{0}`")]
    UnsupportedContentType(String),

    /// The codec does not accept this kind of value.
    #[error("content type `{content_type}` requires {expected}")]
    KindMismatch {
        /// Response content type.
        content_type: String,
        /// What the codec accepts.
        expected: &'static str,
    },

    /// The codec failed.
    #[error("cannot encode {family} response: {reason}")]
    Encode {
        /// Codec family.
        family: MediaFamily,
        /// Underlying message.
        reason: String,
    },
}

impl SerializeError {
    fn encode(family: MediaFamily, reason: impl std::fmt::Display) -> Self {
        Self::Encode {
            family,
            reason: reason.to_string(),
        }
    }
}

impl From<SerializeError> for HttpError {
    fn from(err: SerializeError) -> Self {
        HttpError::internal(err.to_string())
    }
}

/// Audio and video are accepted as raw bytes on responses only.
fn streamed_media(content_type: &str) -> Option<MediaFamily> {
    let essence = media::essence(content_type);
    (essence.starts_with("audio/") || essence.starts_with("video/")).then_some(MediaFamily::Binary)
}

/// Encodes `value` for `content_type`.
///
/// Returns `None` when there is nothing to send: a unit value or a `None`.
pub fn serialize_response<T>(
    value: &T,
    content_type: &str,
    media: &MediaTypes,
) -> Result<Option<Bytes>, SerializeError>
where
    T: Serialize + Describe,
{
    let shape = T::shape();
    if is_empty(value, &shape) {
        return Ok(None);
    }

    let mismatch = |expected| SerializeError::KindMismatch {
        content_type: content_type.to_string(),
        expected,
    };

    // every text/* type writes raw text, even text/xml
    if media::essence(content_type).starts_with("text/") {
        if shape.unwrap_optional() != &TypeShape::String {
            return Err(mismatch("a string"));
        }
        return match serde_json::to_value(value) {
            Ok(serde_json::Value::String(text)) => Ok(Some(Bytes::from(text))),
            Ok(_) => Err(mismatch("a string")),
            Err(e) => Err(SerializeError::encode(MediaFamily::Text, e)),
        };
    }

    let family = media
        .classify(content_type)
        .or_else(|| streamed_media(content_type))
        .ok_or_else(|| SerializeError::UnsupportedContentType(content_type.to_string()))?;

    let body = match family {
        MediaFamily::Json => {
            serde_json::to_vec(value).map_err(|e| SerializeError::encode(family, e))?
        }
        MediaFamily::Xml => encode_xml(value, &shape)?.into_bytes(),
        MediaFamily::Form | MediaFamily::Multipart => {
            let string_map = matches!(
                shape.unwrap_optional(),
                TypeShape::Map { key, value }
                    if **key == TypeShape::String && **value == TypeShape::String
            );
            if !string_map {
                return Err(mismatch("a map of strings to strings"));
            }
            serde_urlencoded::to_string(value)
                .map_err(|e| SerializeError::encode(family, e))?
                .into_bytes()
        }
        MediaFamily::Binary => {
            if shape.unwrap_optional() != &TypeShape::Bytes {
                return Err(mismatch("a byte sequence"));
            }
            raw_bytes(value).map_err(|e| SerializeError::encode(family, e))?
        }
        MediaFamily::Text => return Err(mismatch("a string")),
    };
    Ok(Some(Bytes::from(body)))
}

/// Encodes an error body, as XML when the response was going to be XML and
/// as JSON otherwise. Returns the content type alongside the bytes.
pub fn serialize_error(
    err: &HttpError,
    content_type: Option<&str>,
    media: &MediaTypes,
) -> (&'static str, Bytes) {
    let wants_xml = content_type.and_then(|ct| media.classify(ct)) == Some(MediaFamily::Xml);
    if wants_xml {
        if let Ok(xml) = quick_xml::se::to_string(err) {
            return (media::APPLICATION_XML, Bytes::from(xml));
        }
    }
    let body = serde_json::to_vec(err).unwrap_or_else(|_| b"{}".to_vec());
    (media::APPLICATION_JSON, Bytes::from(body))
}

fn is_empty<T: Serialize>(value: &T, shape: &TypeShape) -> bool {
    match shape {
        TypeShape::Unit => true,
        TypeShape::Optional(_) => matches!(serde_json::to_value(value), Ok(serde_json::Value::Null)),
        _ => false,
    }
}

fn encode_xml<T: Serialize>(value: &T, shape: &TypeShape) -> Result<String, SerializeError> {
    let encoded = if shape.as_struct().is_some() {
        quick_xml::se::to_string(value)
    } else {
        quick_xml::se::to_string_with_root(XML_ROOT, value)
    };
    encoded.map_err(|e| SerializeError::encode(MediaFamily::Xml, e))
}

/// `Vec<u8>` serializes as a sequence and `Bytes` as a byte string; both
/// come out of `serde_json` as an array of numbers.
fn raw_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, String> {
    match serde_json::to_value(value).map_err(|e| e.to_string())? {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| format!("`{item}` is not a byte"))
            })
            .collect(),
        other => Err(format!("expected bytes, found `{other}`")),
    }
}
