//! Body decoding.
//!
//! The codec is chosen from the live `Content-Type` of the request, never
//! from the content type declared on the field; the declared one only feeds
//! the OpenAPI document.

use lite_core::{FieldDescriptor, Kind, MediaFamily, TypeShape};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::value::SeqDeserializer;
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};

use crate::form::FormSource;
use crate::param::{ParamDeserializer, ParamError};
use crate::{ExtractionContext, ExtractionError};

/// Decodes the request body into the body field.
pub fn decode_body<T: DeserializeOwned>(
    cx: &ExtractionContext,
    field: &FieldDescriptor,
) -> Result<T, ExtractionError> {
    let body = cx.body();
    if body.is_empty() && !field.required {
        return T::deserialize(ParamDeserializer::new(None).with_shape(&field.shape))
            .map_err(|e| ExtractionError::body(MediaFamily::Text, e));
    }

    let content_type = cx.content_type().ok_or(ExtractionError::MissingContentType)?;
    let family = cx
        .media_types()
        .classify(content_type)
        .ok_or_else(|| ExtractionError::UnsupportedMediaType(content_type.to_string()))?;

    match family {
        MediaFamily::Json => {
            serde_json::from_slice(body).map_err(|e| ExtractionError::body(family, e))
        }
        MediaFamily::Xml => {
            let text = std::str::from_utf8(body).map_err(|e| ExtractionError::body(family, e))?;
            ensure_well_formed(text).map_err(ExtractionError::MalformedXml)?;
            quick_xml::de::from_str(text).map_err(|e| ExtractionError::body(family, e))
        }
        MediaFamily::Form => {
            let pairs: Vec<(String, String)> = form_urlencoded::parse(body).into_owned().collect();
            let source = FormSource::from_pairs(&pairs);
            from_form(&source, field, family)
        }
        MediaFamily::Multipart => {
            let source = FormSource::from_parts(cx.parts())
                .map_err(|e| ExtractionError::body(family, e))?;
            from_form(&source, field, family)
        }
        MediaFamily::Text => {
            if field.shape.unwrap_optional() != &TypeShape::String {
                return Err(ExtractionError::KindMismatch {
                    family,
                    kind: field.kind,
                });
            }
            let text = std::str::from_utf8(body).map_err(|e| ExtractionError::body(family, e))?;
            T::deserialize(ParamDeserializer::new(Some(text)).with_shape(&field.shape))
                .map_err(|e| ExtractionError::body(family, e))
        }
        MediaFamily::Binary => {
            if field.kind != Kind::Bytes {
                return Err(ExtractionError::KindMismatch {
                    family,
                    kind: field.kind,
                });
            }
            T::deserialize(RawBytes(body)).map_err(|e| ExtractionError::body(family, e))
        }
    }
}

/// Scans an XML document for unbalanced or mismatched elements.
fn ensure_well_formed(text: &str) -> Result<(), String> {
    let mut reader = Reader::from_str(text);
    let mut depth = 0_usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) if depth == 0 => return Ok(()),
            Ok(Event::Eof) => return Err(format!("document ends with {depth} unclosed element(s)")),
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
    }
}

fn from_form<T: DeserializeOwned>(
    source: &FormSource<'_>,
    field: &FieldDescriptor,
    family: MediaFamily,
) -> Result<T, ExtractionError> {
    if !matches!(field.kind, Kind::Struct | Kind::Map) {
        return Err(ExtractionError::KindMismatch {
            family,
            kind: field.kind,
        });
    }
    T::deserialize(source.node(&field.shape)).map_err(|e| ExtractionError::body(family, e))
}

/// Hands raw body bytes to a byte-sequence target.
struct RawBytes<'a>(&'a [u8]);

impl<'de> Deserializer<'de> for RawBytes<'de> {
    type Error = ParamError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_borrowed_bytes(self.0)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_some(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_seq(SeqDeserializer::<_, ParamError>::new(self.0.iter().copied()))
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(de::Error::custom(format!(
            "raw bytes cannot be read into struct `{name}`"
        )))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct tuple tuple_struct map enum
        identifier ignored_any
    }
}
