//! Form and multipart body mapping.
//!
//! URL-encoded and multipart bodies are flat `name → value` lists. The body
//! type's [`TypeShape`] drives the mapping: every struct field looks up its
//! serde name in the same flat key space, nested structs included, and
//! missing scalars fall back to their zero value. The resulting tree is then
//! handed to serde, so the body type only needs `Deserialize`.

use lite_core::{StructShape, TypeShape};
use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{self, Deserializer, IntoDeserializer, Visitor};

use crate::multipart::Part;
use crate::param::{ParamDeserializer, ParamError};

/// Nested structs are not expanded beyond this depth.
const MAX_DEPTH: usize = 8;

/// Flat view over a form or the value and file parts of a multipart body.
#[derive(Debug, Default)]
pub struct FormSource<'a> {
    values: Vec<(&'a str, &'a str)>,
    files: Vec<&'a Part>,
}

impl<'a> FormSource<'a> {
    /// Source over decoded URL-encoded pairs.
    #[must_use]
    pub fn from_pairs(pairs: &'a [(String, String)]) -> Self {
        Self {
            values: pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
            files: Vec::new(),
        }
    }

    /// Source over multipart parts. Value parts must be valid UTF-8.
    pub fn from_parts(parts: &'a [Part]) -> Result<Self, ParamError> {
        let mut source = Self::default();
        for part in parts {
            if part.is_file() {
                source.files.push(part);
            } else {
                let text = std::str::from_utf8(&part.data).map_err(|_| {
                    ParamError(format!("part `{}` is not valid UTF-8", part.name))
                })?;
                source.values.push((part.name.as_str(), text));
            }
        }
        Ok(source)
    }

    fn texts(&self, name: &str) -> Vec<&'a str> {
        self.values
            .iter()
            .filter(|(k, _)| *k == name)
            .map(|(_, v)| *v)
            .collect()
    }

    fn files(&self, name: &str) -> Vec<&'a Part> {
        self.files.iter().copied().filter(|p| p.name == name).collect()
    }

    /// Builds the value tree for a body of `shape`.
    #[must_use]
    pub fn node(&self, shape: &TypeShape) -> FormNode<'a> {
        match shape.unwrap_optional() {
            TypeShape::Map { .. } => FormNode::Map(
                self.values
                    .iter()
                    .map(|(k, v)| (*k, FormNode::Text(ParamDeserializer::new(Some(*v)))))
                    .collect(),
            ),
            TypeShape::Struct(s) => self.struct_node(s, 0).0,
            other => FormNode::Text(ParamDeserializer::new(None).with_shape(other)),
        }
    }

    fn struct_node(&self, shape: &StructShape, depth: usize) -> (FormNode<'a>, bool) {
        let mut entries = Vec::new();
        let mut found = false;
        for field in shape.flat_fields() {
            let (node, hit) = self.field_node(field.name, &field.shape, depth);
            found |= hit;
            entries.push((field.name, node));
        }
        (FormNode::Struct(entries), found)
    }

    fn field_node(&self, name: &str, shape: &TypeShape, depth: usize) -> (FormNode<'a>, bool) {
        let inner = shape.unwrap_optional();
        let files = self.files(name);

        let (node, found) = match inner {
            TypeShape::Struct(s) => {
                if depth >= MAX_DEPTH {
                    (FormNode::Null, false)
                } else {
                    self.struct_node(s, depth + 1)
                }
            }
            TypeShape::File => match files.first().copied() {
                Some(part) => (FormNode::File(part), true),
                None => (FormNode::Null, false),
            },
            TypeShape::Seq(item) if **item == TypeShape::File => {
                let found = !files.is_empty();
                (FormNode::Seq(files.into_iter().map(FormNode::File).collect()), found)
            }
            TypeShape::Bytes | TypeShape::String if !files.is_empty() => {
                let data: &'a [u8] = files[0].data.as_ref();
                if *inner == TypeShape::Bytes {
                    (FormNode::Bytes(data), true)
                } else {
                    match std::str::from_utf8(data) {
                        Ok(text) => (FormNode::Text(ParamDeserializer::new(Some(text))), true),
                        Err(_) => (FormNode::Invalid(format!("file `{name}` is not valid UTF-8")), true),
                    }
                }
            }
            TypeShape::Seq(_) => {
                let values = self.texts(name);
                let found = !values.is_empty();
                (
                    FormNode::Text(ParamDeserializer::many(values).with_shape(inner)),
                    found,
                )
            }
            _ => {
                let value = self.texts(name).into_iter().next();
                (
                    FormNode::Text(ParamDeserializer::new(value).with_shape(inner)),
                    value.is_some_and(|v| !v.is_empty()),
                )
            }
        };

        if shape.is_optional() && !found {
            (FormNode::Null, false)
        } else {
            (node, found)
        }
    }
}

/// Value tree produced from a form, deserialized by serde.
#[derive(Debug, Clone)]
pub enum FormNode<'a> {
    /// Absent optional value.
    Null,
    /// A string-valued leaf.
    Text(ParamDeserializer<'a>),
    /// Raw file contents.
    Bytes(&'a [u8]),
    /// A file part with its metadata.
    File(&'a Part),
    /// A list.
    Seq(Vec<FormNode<'a>>),
    /// A struct, fields keyed by serde name.
    Struct(Vec<(&'static str, FormNode<'a>)>),
    /// Free-form map.
    Map(Vec<(&'a str, FormNode<'a>)>),
    /// A value that could not be read.
    Invalid(String),
}

impl<'de> IntoDeserializer<'de, ParamError> for FormNode<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

fn optional_text(value: Option<&str>) -> FormNode<'_> {
    match value {
        Some(v) => FormNode::Text(
            ParamDeserializer::new(Some(v)).with_shape(&TypeShape::optional(TypeShape::String)),
        ),
        None => FormNode::Null,
    }
}

fn file_entries(part: &Part) -> Vec<(&'static str, FormNode<'_>)> {
    vec![
        ("field_name", FormNode::Text(ParamDeserializer::new(Some(part.name.as_str())))),
        ("file_name", optional_text(part.file_name.as_deref())),
        ("content_type", optional_text(part.content_type.as_deref())),
        ("data", FormNode::Bytes(part.data.as_ref())),
    ]
}

impl<'de> Deserializer<'de> for FormNode<'de> {
    type Error = ParamError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Self::Null => visitor.visit_none(),
            Self::Text(inner) => inner.deserialize_any(visitor),
            Self::Bytes(data) => visitor.visit_borrowed_bytes(data),
            Self::File(part) => visitor.visit_map(MapDeserializer::new(file_entries(part).into_iter())),
            Self::Seq(items) => visitor.visit_seq(SeqDeserializer::new(items.into_iter())),
            Self::Struct(entries) => visitor.visit_map(MapDeserializer::new(entries.into_iter())),
            Self::Map(entries) => visitor.visit_map(MapDeserializer::new(entries.into_iter())),
            Self::Invalid(reason) => Err(de::Error::custom(reason)),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Self::Null => visitor.visit_none(),
            Self::Text(inner) => inner.deserialize_option(visitor),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Self::Bytes(data) => {
                visitor.visit_seq(SeqDeserializer::<_, ParamError>::new(data.iter().copied()))
            }
            Self::Text(inner) => inner.deserialize_seq(visitor),
            Self::Null => visitor.visit_seq(SeqDeserializer::<_, ParamError>::new(
                std::iter::empty::<FormNode<'de>>(),
            )),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self {
            Self::Text(inner) => inner.deserialize_enum(name, variants, visitor),
            other => other.deserialize_any(visitor),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct tuple tuple_struct map struct
        identifier ignored_any
    }
}
