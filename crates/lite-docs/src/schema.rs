//! Schema derivation from type shapes.
//!
//! Named structs are stored once in `components.schemas` under their schema
//! name and referenced everywhere else; the first registration of a name
//! wins. Everything else is described inline.

use indexmap::IndexMap;
use lite_core::{StructShape, TypeShape};

use crate::openapi::Schema;

/// Writes struct schemas into a component table.
pub struct SchemaGenerator<'a> {
    schemas: &'a mut IndexMap<String, Schema>,
}

impl<'a> SchemaGenerator<'a> {
    /// Generator over `components.schemas`.
    pub fn new(schemas: &'a mut IndexMap<String, Schema>) -> Self {
        Self { schemas }
    }

    /// Schema for `shape`. Errors carry a human readable reason.
    pub fn schema_for(&mut self, shape: &TypeShape) -> Result<Schema, String> {
        Ok(match shape {
            TypeShape::Bool => Schema::boolean(),
            TypeShape::Int { bits, .. } if *bits <= 32 => Schema::integer("int32"),
            TypeShape::Int { .. } => Schema::integer("int64"),
            TypeShape::Float { bits: 32 } => Schema::number("float"),
            TypeShape::Float { .. } => Schema::number("double"),
            TypeShape::String => Schema::string(),
            TypeShape::Bytes => Schema::string_format("byte"),
            TypeShape::File => Schema::string_format("binary"),
            TypeShape::Optional(inner) => self.schema_for(inner)?,
            TypeShape::Seq(item) => Schema::array(self.schema_for(item)?),
            TypeShape::Map { key, value } => {
                if **key != TypeShape::String {
                    return Err("maps must have string keys".to_string());
                }
                Schema::map(self.schema_for(value)?)
            }
            TypeShape::Struct(shape) => self.component(shape)?,
            TypeShape::Dynamic => Schema::default(),
            TypeShape::Unit => return Err("unit values carry no data".to_string()),
            TypeShape::Unsupported(name) => return Err(format!("type `{name}` is not supported")),
        })
    }

    fn component(&mut self, shape: &StructShape) -> Result<Schema, String> {
        let name = shape.name();
        if self.schemas.contains_key(name) {
            return Ok(Schema::component(name));
        }
        // placeholder so that recursive types terminate
        self.schemas.insert(name.to_string(), Schema::object());

        let mut schema = Schema::object();
        for field in shape.flat_fields() {
            let property = self
                .schema_for(&field.shape)
                .map_err(|reason| format!("field `{}` of `{name}`: {reason}", field.name))?;
            if is_required(&field.shape) {
                schema.required.push(field.name.to_string());
            }
            schema.properties.insert(field.name.to_string(), property);
        }
        self.schemas.insert(name.to_string(), schema);
        Ok(Schema::component(name))
    }
}

/// A struct field is required unless it is optional. Sequences of optional
/// structs are never required.
fn is_required(shape: &TypeShape) -> bool {
    match shape {
        TypeShape::Optional(_) => false,
        TypeShape::Seq(item) => match item.as_ref() {
            TypeShape::Optional(inner) => !matches!(inner.as_ref(), TypeShape::Struct(_)),
            _ => true,
        },
        _ => true,
    }
}
