//! Scalar conversion.
//!
//! Path, query, header and cookie values arrive as strings. [`ParamDeserializer`]
//! turns one (or, for repeated query keys, several) of them into any
//! `Deserialize` type:
//!
//! - absent or empty values produce the zero value: `0`, `false`, `""`,
//!   `None` or an empty sequence;
//! - integers parse with their exact width, so `"256"` does not fit a `u8`;
//! - booleans accept `1 t T TRUE true True` and `0 f F FALSE false False`;
//! - byte sequences receive the raw bytes of the string.

use std::fmt;

use lite_core::TypeShape;
use serde::de::value::SeqDeserializer;
use serde::de::{self, Deserializer, IntoDeserializer, Visitor};
use thiserror::Error;

/// Conversion failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ParamError(pub String);

impl de::Error for ParamError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

/// Parses a boolean the way the binder does.
pub fn parse_bool(value: &str) -> Result<bool, ParamError> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(ParamError(format!("invalid boolean `{other}`"))),
    }
}

#[derive(Debug, Clone)]
enum Input<'a> {
    One(Option<&'a str>),
    Many(Vec<&'a str>),
}

/// Deserializer over string-valued request parameters.
///
/// ```
/// use lite_extract::ParamDeserializer;
/// use serde::Deserialize;
///
/// let n = u8::deserialize(ParamDeserializer::new(Some("42"))).unwrap();
/// assert_eq!(n, 42);
/// assert!(u8::deserialize(ParamDeserializer::new(Some("256"))).is_err());
///
/// let zero = u32::deserialize(ParamDeserializer::new(None)).unwrap();
/// assert_eq!(zero, 0);
/// let none = Option::<u32>::deserialize(ParamDeserializer::new(Some(""))).unwrap();
/// assert_eq!(none, None);
/// ```
#[derive(Debug, Clone)]
pub struct ParamDeserializer<'a> {
    input: Input<'a>,
    shape: TypeShape,
}

impl<'a> ParamDeserializer<'a> {
    /// A single, possibly absent, value.
    #[must_use]
    pub fn new(value: Option<&'a str>) -> Self {
        Self {
            input: Input::One(value.filter(|v| !v.is_empty())),
            shape: TypeShape::String,
        }
    }

    /// Every value of a repeated key.
    #[must_use]
    pub fn many(values: Vec<&'a str>) -> Self {
        Self {
            input: Input::Many(values),
            shape: TypeShape::String,
        }
    }

    /// Sets the shape of the target.
    ///
    /// Byte sequences only receive the raw string when the shape says so, and
    /// `deserialize_any` (used by serde when buffering, e.g. for
    /// `#[serde(flatten)]`) produces a value typed after the shape.
    #[must_use]
    pub fn with_shape(mut self, shape: &TypeShape) -> Self {
        self.shape = shape.clone();
        self
    }

    fn value(&self) -> Option<&'a str> {
        match &self.input {
            Input::One(v) => *v,
            Input::Many(values) => values.iter().copied().find(|v| !v.is_empty()),
        }
    }

    fn items(&self) -> Vec<&'a str> {
        match &self.input {
            Input::One(None) => Vec::new(),
            Input::One(Some(v)) => v.split(',').map(str::trim).collect(),
            Input::Many(values) => values.clone(),
        }
    }

    fn parse<T>(&self, what: &str) -> Result<Option<T>, ParamError>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        self.value()
            .map(|v| {
                v.trim()
                    .parse::<T>()
                    .map_err(|e| ParamError(format!("invalid {what} `{v}`: {e}")))
            })
            .transpose()
    }
}

macro_rules! deserialize_number {
    ($($method:ident => $ty:ty, $visit:ident;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                visitor.$visit(self.parse::<$ty>(stringify!($ty))?.unwrap_or_default())
            }
        )*
    };
}

impl<'de> Deserializer<'de> for ParamDeserializer<'de> {
    type Error = ParamError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match &self.shape {
            TypeShape::Optional(_) => self.deserialize_option(visitor),
            TypeShape::Bool => self.deserialize_bool(visitor),
            TypeShape::Int { signed: true, .. } => self.deserialize_i64(visitor),
            TypeShape::Int { signed: false, .. } => self.deserialize_u64(visitor),
            TypeShape::Float { .. } => self.deserialize_f64(visitor),
            TypeShape::Bytes => self.deserialize_bytes(visitor),
            TypeShape::Seq(_) => self.deserialize_seq(visitor),
            TypeShape::Unit => self.deserialize_unit(visitor),
            _ => self.deserialize_str(visitor),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let value = self.value().map(parse_bool).transpose()?;
        visitor.visit_bool(value.unwrap_or(false))
    }

    deserialize_number! {
        deserialize_i8 => i8, visit_i8;
        deserialize_i16 => i16, visit_i16;
        deserialize_i32 => i32, visit_i32;
        deserialize_i64 => i64, visit_i64;
        deserialize_i128 => i128, visit_i128;
        deserialize_u8 => u8, visit_u8;
        deserialize_u16 => u16, visit_u16;
        deserialize_u32 => u32, visit_u32;
        deserialize_u64 => u64, visit_u64;
        deserialize_u128 => u128, visit_u128;
        deserialize_f32 => f32, visit_f32;
        deserialize_f64 => f64, visit_f64;
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_char(self.parse::<char>("char")?.unwrap_or_default())
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_borrowed_str(self.value().unwrap_or_default())
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_borrowed_bytes(self.value().unwrap_or_default().as_bytes())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let present = match &self.input {
            Input::One(v) => v.is_some(),
            Input::Many(values) => !values.is_empty(),
        };
        if present {
            let shape = self.shape.unwrap_optional().clone();
            visitor.visit_some(Self { shape, ..self })
        } else {
            visitor.visit_none()
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        if self.shape.unwrap_optional() == &TypeShape::Bytes {
            let bytes = self.value().unwrap_or_default().as_bytes().iter().copied();
            return visitor.visit_seq(SeqDeserializer::<_, ParamError>::new(bytes));
        }
        let item = match self.shape.unwrap_optional() {
            TypeShape::Seq(item) => item.as_ref().clone(),
            _ => TypeShape::String,
        };
        let items = self
            .items()
            .into_iter()
            .map(|v| ParamDeserializer::new(Some(v)).with_shape(&item));
        visitor.visit_seq(SeqDeserializer::<_, ParamError>::new(items))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(ParamError("a map cannot be read from a single parameter".to_string()))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(ParamError(format!(
            "struct `{name}` cannot be read from a single parameter"
        )))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let value = self
            .value()
            .ok_or_else(|| ParamError("missing value".to_string()))?;
        visitor.visit_enum(value.into_deserializer())
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }
}

impl<'de> IntoDeserializer<'de, ParamError> for ParamDeserializer<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}
