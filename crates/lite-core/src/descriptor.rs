//! Field descriptors.
//!
//! A request type hands over its raw field metadata ([`RawField`]) once, at
//! route registration. [`RequestDescriptor::compile`] parses every annotation,
//! classifies every type and checks the structural rules, so the binder and
//! the OpenAPI emitter both work from the same validated view.

use thiserror::Error;

use crate::error::HttpError;
use crate::kind::{classify, unsupported_reason, Kind};
use crate::media::APPLICATION_JSON;
use crate::shape::TypeShape;
use crate::tag::{self, TagError, TagLocation};

/// Raw metadata of one request field, as emitted by `#[derive(LiteRequest)]`.
#[derive(Debug, Clone)]
pub struct RawField {
    /// Rust identifier of the field.
    pub ident: &'static str,
    /// The `lite` annotation, if any.
    pub tag: Option<&'static str>,
    /// Shape of the field type.
    pub shape: TypeShape,
    /// Field metadata of an embedded request struct.
    pub embedded: Option<fn() -> Vec<RawField>>,
}

impl RawField {
    /// A field carrying an annotation.
    #[must_use]
    pub const fn tagged(ident: &'static str, tag: &'static str, shape: TypeShape) -> Self {
        Self {
            ident,
            tag: Some(tag),
            shape,
            embedded: None,
        }
    }

    /// An unannotated field whose type is itself a request struct.
    #[must_use]
    pub const fn embedded(
        ident: &'static str,
        shape: TypeShape,
        fields: fn() -> Vec<RawField>,
    ) -> Self {
        Self {
            ident,
            tag: None,
            shape,
            embedded: Some(fields),
        }
    }

    /// An unannotated field with no request metadata.
    #[must_use]
    pub const fn untagged(ident: &'static str, shape: TypeShape) -> Self {
        Self {
            ident,
            tag: None,
            shape,
            embedded: None,
        }
    }
}

/// Security hints of an auth header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthScheme {
    /// HTTP auth scheme, e.g. `bearer`.
    pub scheme: String,
    /// Name of the security scheme entry.
    pub name: String,
}

/// Where a field is read from.
#[derive(Debug, Clone)]
pub enum Location {
    /// A `:name` path segment.
    Path {
        /// Segment name.
        name: String,
    },
    /// A query parameter.
    Query {
        /// Query key.
        name: String,
    },
    /// A request header.
    Header {
        /// Header name.
        name: String,
        /// Set when the header carries credentials.
        auth: Option<AuthScheme>,
    },
    /// A cookie.
    Cookie {
        /// Cookie name.
        name: String,
    },
    /// The request body.
    Body {
        /// Declared content type.
        content_type: String,
    },
    /// A nested request struct whose fields are bound in place.
    Embedded(RequestDescriptor),
}

impl Location {
    /// External name for parameters, `None` for bodies and embedded structs.
    #[must_use]
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            Self::Path { name }
            | Self::Query { name }
            | Self::Header { name, .. }
            | Self::Cookie { name } => Some(name),
            Self::Body { .. } | Self::Embedded(_) => None,
        }
    }
}

/// Compiled view of one request field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Rust identifier.
    pub ident: &'static str,
    /// Where the value comes from.
    pub location: Location,
    /// Binding class of the type.
    pub kind: Kind,
    /// False only for `Option` fields.
    pub required: bool,
    /// Shape of the field type.
    pub shape: TypeShape,
}

/// Registration-time failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// A field annotation failed to parse.
    #[error("field `{field}`: {source}")]
    Tag {
        /// Field identifier.
        field: String,
        /// Parse failure.
        #[source]
        source: TagError,
    },

    /// A field has no annotation and is not an embedded struct.
    #[error("field `{field}` of kind {kind} has no lite annotation")]
    Untagged {
        /// Field identifier.
        field: String,
        /// Its kind.
        kind: Kind,
    },

    /// A field type cannot be bound.
    #[error("field `{field}`: {reason}")]
    UnsupportedKind {
        /// Field identifier.
        field: String,
        /// Why the type is rejected.
        reason: String,
    },

    /// A parameter field has a type that cannot be read from a string.
    #[error("field `{field}`: a {kind} cannot be read from a {location} parameter")]
    UnsupportedParameter {
        /// Field identifier.
        field: String,
        /// Parameter location.
        location: TagLocation,
        /// Field kind.
        kind: Kind,
    },

    /// More than one body field.
    #[error("fields `{first}` and `{second}` are both marked req=body")]
    MultipleBodies {
        /// First body field.
        first: String,
        /// Second body field.
        second: String,
    },

    /// A body field lists several content types.
    #[error("field `{field}` declares {count} content types, only one is allowed")]
    MultipleContentTypes {
        /// Field identifier.
        field: String,
        /// Number declared.
        count: usize,
    },

    /// Path fields and template segments disagree.
    #[error("route `{path}` has {template} path segments but the request declares {declared} path fields")]
    PathArity {
        /// Route template.
        path: String,
        /// `:name` segments in the template.
        template: usize,
        /// Path fields in the request type.
        declared: usize,
    },

    /// A declared path field does not match any template segment.
    #[error("route `{path}` has no `:{name}` segment")]
    UnknownPathParameter {
        /// Route template.
        path: String,
        /// Field's segment name.
        name: String,
    },

    /// The route template is malformed.
    #[error("invalid route `{path}`: {reason}")]
    InvalidPath {
        /// Route template.
        path: String,
        /// What is wrong.
        reason: String,
    },

    /// The same method and path were registered twice.
    #[error("route {method} {path} is already registered")]
    DuplicateRoute {
        /// HTTP method.
        method: String,
        /// Route template.
        path: String,
    },

    /// The OpenAPI emitter could not describe a type.
    #[error("cannot describe {context}: {reason}")]
    Schema {
        /// What was being described.
        context: String,
        /// Why it failed.
        reason: String,
    },
}

/// Compiled descriptors of a request type, in field declaration order.
#[derive(Debug, Clone, Default)]
pub struct RequestDescriptor {
    fields: Vec<FieldDescriptor>,
}

impl RequestDescriptor {
    /// Compiles raw field metadata.
    pub fn compile(raw: Vec<RawField>) -> Result<Self, RegistrationError> {
        let descriptor = Self::compile_level(raw)?;

        let bodies: Vec<_> = descriptor
            .leaves()
            .filter(|f| matches!(f.location, Location::Body { .. }))
            .map(|f| f.ident.to_string())
            .take(2)
            .collect();
        if let [first, second] = bodies.as_slice() {
            return Err(RegistrationError::MultipleBodies {
                first: first.clone(),
                second: second.clone(),
            });
        }

        Ok(descriptor)
    }

    fn compile_level(raw: Vec<RawField>) -> Result<Self, RegistrationError> {
        let fields = raw
            .into_iter()
            .map(compile_field)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { fields })
    }

    /// Top-level fields, embedded structs unexpanded.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Every non-embedded field, embedded structs expanded in declaration order.
    pub fn leaves(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out.into_iter()
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FieldDescriptor>) {
        for field in &self.fields {
            match &field.location {
                Location::Embedded(inner) => inner.collect_leaves(out),
                _ => out.push(field),
            }
        }
    }

    /// The body field, wherever it is nested.
    #[must_use]
    pub fn body(&self) -> Option<&FieldDescriptor> {
        self.leaves()
            .find(|f| matches!(f.location, Location::Body { .. }))
    }

    /// Names of every path field.
    #[must_use]
    pub fn path_names(&self) -> Vec<&str> {
        self.leaves()
            .filter_map(|f| match &f.location {
                Location::Path { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Checks the path fields against the `:name` segments of a route template.
    pub fn check_path_parameters(
        &self,
        path: &str,
        template_names: &[String],
    ) -> Result<(), RegistrationError> {
        let declared = self.path_names();
        if declared.len() != template_names.len() {
            return Err(RegistrationError::PathArity {
                path: path.to_string(),
                template: template_names.len(),
                declared: declared.len(),
            });
        }
        if let Some(name) = declared.iter().find(|n| !template_names.iter().any(|t| t == *n)) {
            return Err(RegistrationError::UnknownPathParameter {
                path: path.to_string(),
                name: (*name).to_string(),
            });
        }
        Ok(())
    }

    /// Field at `index`, for generated binders.
    pub fn field(&self, index: usize) -> Result<&FieldDescriptor, HttpError> {
        self.fields
            .get(index)
            .ok_or_else(|| HttpError::internal(format!("no request field at index {index}")))
    }

    /// Embedded descriptor at `index`, for generated binders.
    pub fn embedded(&self, index: usize) -> Result<&Self, HttpError> {
        match &self.field(index)?.location {
            Location::Embedded(inner) => Ok(inner),
            _ => Err(HttpError::internal(format!(
                "request field at index {index} is not embedded"
            ))),
        }
    }
}

fn compile_field(raw: RawField) -> Result<FieldDescriptor, RegistrationError> {
    let field = raw.ident.to_string();
    let kind = classify(&raw.shape);
    let required = !raw.shape.is_optional();

    let annotation = raw.tag.map(str::trim).filter(|t| !t.is_empty());
    let Some(annotation) = annotation else {
        return match (raw.embedded, kind) {
            (Some(fields), Kind::Struct) => Ok(FieldDescriptor {
                ident: raw.ident,
                location: Location::Embedded(RequestDescriptor::compile_level(fields())?),
                kind,
                required,
                shape: raw.shape,
            }),
            _ => Err(RegistrationError::Untagged { field, kind }),
        };
    };

    if kind == Kind::Unsupported {
        return Err(RegistrationError::UnsupportedKind {
            reason: unsupported_reason(&raw.shape),
            field,
        });
    }

    let tag = tag::parse(annotation).map_err(|source| RegistrationError::Tag {
        field: field.clone(),
        source,
    })?;

    if tag.location != TagLocation::Body && !kind.is_parameter() {
        return Err(RegistrationError::UnsupportedParameter {
            field,
            location: tag.location,
            kind,
        });
    }

    let location = match tag.location {
        TagLocation::Path => Location::Path { name: tag.name },
        TagLocation::Query => Location::Query { name: tag.name },
        TagLocation::Cookie => Location::Cookie { name: tag.name },
        TagLocation::Header => Location::Header {
            name: tag.name,
            auth: tag.auth.map(|a| AuthScheme {
                scheme: a.scheme,
                name: a.name,
            }),
        },
        TagLocation::Body => {
            if tag.content_types.len() > 1 {
                return Err(RegistrationError::MultipleContentTypes {
                    field,
                    count: tag.content_types.len(),
                });
            }
            Location::Body {
                content_type: tag
                    .content_types
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| APPLICATION_JSON.to_string()),
            }
        }
    };

    Ok(FieldDescriptor {
        ident: raw.ident,
        location,
        kind,
        required,
        shape: raw.shape,
    })
}
