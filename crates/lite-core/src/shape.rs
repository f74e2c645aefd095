//! Runtime type shapes.
//!
//! A [`TypeShape`] is the compile-time-free description of a Rust type that
//! both the request binder and the OpenAPI emitter walk. It stands in for
//! runtime reflection: every request, response and body type implements
//! [`Describe`], usually through `#[derive(Describe)]`.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use indexmap::IndexMap;

/// Maximum number of container levels unwrapped when naming a type.
pub const MAX_DIVE_DEPTH: usize = 4;

/// Name used when the dive runs out of levels.
pub const DEFAULT_DIVE_NAME: &str = "default";

/// Name used for dynamically typed values.
pub const UNKNOWN_INTERFACE_NAME: &str = "unknown-interface";

/// Structural description of a Rust type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    /// `bool`.
    Bool,
    /// Fixed-width integer.
    Int {
        /// Width in bits.
        bits: u8,
        /// Whether the integer is signed.
        signed: bool,
    },
    /// `f32` or `f64`.
    Float {
        /// Width in bits.
        bits: u8,
    },
    /// Text.
    String,
    /// `()`, encodes to nothing.
    Unit,
    /// A byte sequence (`Vec<u8>`, `[u8; N]`, `Bytes`).
    Bytes,
    /// An uploaded file from a multipart body.
    File,
    /// `Option<T>`.
    Optional(Box<TypeShape>),
    /// A homogeneous sequence.
    Seq(Box<TypeShape>),
    /// A map.
    Map {
        /// Key shape.
        key: Box<TypeShape>,
        /// Value shape.
        value: Box<TypeShape>,
    },
    /// A named struct.
    Struct(StructShape),
    /// A value whose shape is only known at runtime (`serde_json::Value`).
    Dynamic,
    /// A type the framework cannot bind or document.
    Unsupported(&'static str),
}

impl TypeShape {
    /// Shape of a sequence of `item`, collapsing `u8` items to [`TypeShape::Bytes`].
    #[must_use]
    pub fn seq_of(item: Self) -> Self {
        match item {
            Self::Int {
                bits: 8,
                signed: false,
            } => Self::Bytes,
            other => Self::Seq(Box::new(other)),
        }
    }

    /// Shape of `Option<inner>`.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Shape of a map from `key` to `value`.
    #[must_use]
    pub fn map_of(key: Self, value: Self) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Returns true for `Option<T>`.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Returns true for bool, integer, float and string shapes.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Int { .. } | Self::Float { .. } | Self::String
        )
    }

    /// Strips one `Option` layer, if any.
    #[must_use]
    pub fn unwrap_optional(&self) -> &Self {
        match self {
            Self::Optional(inner) => inner,
            other => other,
        }
    }

    /// Returns the struct shape, looking through `Option`.
    #[must_use]
    pub fn as_struct(&self) -> Option<&StructShape> {
        match self.unwrap_optional() {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Name of a non-struct leaf, as used by [`dive_name`].
    fn leaf_name(&self) -> Cow<'static, str> {
        match self {
            Self::Bool => Cow::Borrowed("bool"),
            Self::Int { bits, signed } => {
                Cow::Owned(format!("{}int{bits}", if *signed { "" } else { "u" }))
            }
            Self::Float { bits } => Cow::Owned(format!("float{bits}")),
            Self::String => Cow::Borrowed("string"),
            Self::Unit => Cow::Borrowed("unit"),
            Self::Bytes => Cow::Borrowed("uint8"),
            Self::File => Cow::Borrowed("file"),
            Self::Dynamic => Cow::Borrowed(UNKNOWN_INTERFACE_NAME),
            Self::Unsupported(name) => Cow::Borrowed(*name),
            Self::Struct(s) => Cow::Owned(s.name().to_string()),
            Self::Optional(_) | Self::Seq(_) | Self::Map { .. } => Cow::Borrowed(DEFAULT_DIVE_NAME),
        }
    }
}

/// Description of a named struct.
///
/// Fields are produced lazily so that self-referential types do not recurse
/// while their shape is being built.
#[derive(Clone)]
pub struct StructShape {
    name: Cow<'static, str>,
    fields: fn() -> Vec<FieldShape>,
}

impl StructShape {
    /// Creates a struct shape.
    pub fn new(name: impl Into<Cow<'static, str>>, fields: fn() -> Vec<FieldShape>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Schema name of the struct.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order, flattened fields left unexpanded.
    #[must_use]
    pub fn fields(&self) -> Vec<FieldShape> {
        (self.fields)()
    }

    /// Fields with every `#[serde(flatten)]` member expanded in place.
    #[must_use]
    pub fn flat_fields(&self) -> Vec<FieldShape> {
        let mut out = Vec::new();
        for field in self.fields() {
            match field.shape.as_struct() {
                Some(inner) if field.flatten => out.extend(inner.flat_fields()),
                _ => out.push(field),
            }
        }
        out
    }
}

impl fmt::Debug for StructShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructShape").field("name", &self.name).finish_non_exhaustive()
    }
}

impl PartialEq for StructShape {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// One field of a [`StructShape`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    /// Wire name of the field (after serde renames).
    pub name: &'static str,
    /// Shape of the field's type.
    pub shape: TypeShape,
    /// Whether the field is `#[serde(flatten)]`.
    pub flatten: bool,
}

impl FieldShape {
    /// Creates a regular field.
    #[must_use]
    pub const fn new(name: &'static str, shape: TypeShape) -> Self {
        Self {
            name,
            shape,
            flatten: false,
        }
    }

    /// Creates a flattened field.
    #[must_use]
    pub const fn flattened(name: &'static str, shape: TypeShape) -> Self {
        Self {
            name,
            shape,
            flatten: true,
        }
    }
}

/// Types that can report their [`TypeShape`].
///
/// Derive it with `#[derive(Describe)]`; the derive honours serde's `rename`,
/// `rename_all`, `flatten` and `skip` attributes so the shape always matches
/// what serde puts on the wire.
pub trait Describe {
    /// Returns the shape of `Self`.
    fn shape() -> TypeShape;
}

/// Names a type by diving through containers.
///
/// Up to [`MAX_DIVE_DEPTH`] levels of `Option`, sequence and map are unwrapped
/// and the element's name is used. Running out of levels yields
/// [`DEFAULT_DIVE_NAME`]; a dynamic value yields [`UNKNOWN_INTERFACE_NAME`].
#[must_use]
pub fn dive_name(shape: &TypeShape) -> String {
    let mut current = shape;
    let mut depth = 0;
    loop {
        let next = match current {
            TypeShape::Optional(inner) | TypeShape::Seq(inner) => inner,
            TypeShape::Map { value, .. } => value,
            leaf => return leaf.leaf_name().into_owned(),
        };
        if depth == MAX_DIVE_DEPTH {
            return DEFAULT_DIVE_NAME.to_string();
        }
        depth += 1;
        current = next;
    }
}

macro_rules! describe_int {
    ($($ty:ty => $bits:expr, $signed:expr;)*) => {
        $(
            impl Describe for $ty {
                fn shape() -> TypeShape {
                    TypeShape::Int { bits: $bits, signed: $signed }
                }
            }
        )*
    };
}

describe_int! {
    i8 => 8, true;
    i16 => 16, true;
    i32 => 32, true;
    i64 => 64, true;
    i128 => 128, true;
    u8 => 8, false;
    u16 => 16, false;
    u32 => 32, false;
    u64 => 64, false;
    u128 => 128, false;
}

impl Describe for usize {
    fn shape() -> TypeShape {
        TypeShape::Unsupported("usize")
    }
}

impl Describe for isize {
    fn shape() -> TypeShape {
        TypeShape::Unsupported("isize")
    }
}

impl Describe for f32 {
    fn shape() -> TypeShape {
        TypeShape::Float { bits: 32 }
    }
}

impl Describe for f64 {
    fn shape() -> TypeShape {
        TypeShape::Float { bits: 64 }
    }
}

impl Describe for bool {
    fn shape() -> TypeShape {
        TypeShape::Bool
    }
}

impl Describe for char {
    fn shape() -> TypeShape {
        TypeShape::String
    }
}

impl Describe for String {
    fn shape() -> TypeShape {
        TypeShape::String
    }
}

impl Describe for &str {
    fn shape() -> TypeShape {
        TypeShape::String
    }
}

impl Describe for () {
    fn shape() -> TypeShape {
        TypeShape::Unit
    }
}

impl Describe for bytes::Bytes {
    fn shape() -> TypeShape {
        TypeShape::Bytes
    }
}

impl Describe for serde_json::Value {
    fn shape() -> TypeShape {
        TypeShape::Dynamic
    }
}

impl<T: Describe> Describe for Option<T> {
    fn shape() -> TypeShape {
        TypeShape::optional(T::shape())
    }
}

impl<T: Describe> Describe for Box<T> {
    fn shape() -> TypeShape {
        T::shape()
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn shape() -> TypeShape {
        TypeShape::seq_of(T::shape())
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn shape() -> TypeShape {
        TypeShape::seq_of(T::shape())
    }
}

impl<K: Describe, V: Describe, S> Describe for HashMap<K, V, S> {
    fn shape() -> TypeShape {
        TypeShape::map_of(K::shape(), V::shape())
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn shape() -> TypeShape {
        TypeShape::map_of(K::shape(), V::shape())
    }
}

impl<K: Describe, V: Describe, S> Describe for IndexMap<K, V, S> {
    fn shape() -> TypeShape {
        TypeShape::map_of(K::shape(), V::shape())
    }
}
