//! Kind classification.
//!
//! Reduces a [`TypeShape`] to the handful of classes the binder and the
//! emitter dispatch on.

use std::fmt;

use crate::shape::TypeShape;

/// Binding class of a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// bool, fixed-width integers, floats and strings.
    Scalar,
    /// `Option` of a scalar.
    OptionalScalar,
    /// A byte sequence.
    Bytes,
    /// A nested struct (optionally behind `Option`).
    Struct,
    /// A sequence of scalars, structs or optional structs.
    Slice,
    /// A map with string keys.
    Map,
    /// An uploaded multipart file.
    File,
    /// Anything the framework cannot bind.
    Unsupported,
}

impl Kind {
    /// Returns true for [`Kind::Scalar`] and [`Kind::OptionalScalar`].
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(self, Self::Scalar | Self::OptionalScalar)
    }

    /// Returns true if a value of this kind can be read from a single string
    /// (path, query, header or cookie).
    #[must_use]
    pub const fn is_parameter(self) -> bool {
        matches!(
            self,
            Self::Scalar | Self::OptionalScalar | Self::Bytes | Self::Slice
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scalar => "scalar",
            Self::OptionalScalar => "optional scalar",
            Self::Bytes => "byte sequence",
            Self::Struct => "struct",
            Self::Slice => "slice",
            Self::Map => "map",
            Self::File => "file",
            Self::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Classifies a shape.
#[must_use]
pub fn classify(shape: &TypeShape) -> Kind {
    match shape {
        s if s.is_scalar() => Kind::Scalar,
        TypeShape::Bytes => Kind::Bytes,
        TypeShape::File => Kind::File,
        TypeShape::Struct(_) => Kind::Struct,
        TypeShape::Optional(inner) => match inner.as_ref() {
            s if s.is_scalar() => Kind::OptionalScalar,
            // pointer to pointer
            TypeShape::Optional(_) => Kind::Unsupported,
            other => classify(other),
        },
        TypeShape::Seq(item) => match item.as_ref() {
            s if s.is_scalar() => Kind::Slice,
            TypeShape::Struct(_) | TypeShape::File => Kind::Slice,
            TypeShape::Optional(inner) if matches!(inner.as_ref(), TypeShape::Struct(_)) => {
                Kind::Slice
            }
            _ => Kind::Unsupported,
        },
        TypeShape::Map { key, .. } if matches!(key.as_ref(), TypeShape::String) => Kind::Map,
        _ => Kind::Unsupported,
    }
}

/// Explains why a shape is [`Kind::Unsupported`], for error messages.
#[must_use]
pub fn unsupported_reason(shape: &TypeShape) -> String {
    match shape {
        TypeShape::Unsupported(name) => format!("type `{name}` is not supported"),
        TypeShape::Dynamic => "dynamically typed values are not supported".to_string(),
        TypeShape::Unit => "unit values carry no data".to_string(),
        TypeShape::Optional(inner) if inner.is_optional() => {
            "nested options are not supported".to_string()
        }
        TypeShape::Optional(inner) => unsupported_reason(inner),
        TypeShape::Seq(_) => "sequences may only hold scalars, structs or files".to_string(),
        TypeShape::Map { .. } => "maps must have string keys".to_string(),
        _ => "unsupported type".to_string(),
    }
}
