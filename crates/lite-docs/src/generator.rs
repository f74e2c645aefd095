//! OpenAPI document generation.
//!
//! The generator walks each route's request descriptor and response shape
//! as the route is registered:
//!
//! - path, query, cookie and plain header fields become parameters stored in
//!   `components.parameters` and referenced from the operation, in field
//!   declaration order;
//! - `isauth` headers become security schemes instead of parameters;
//! - the body field becomes the request body under its declared content type;
//! - the response shape is documented under the method's default status;
//! - 400, 401, 404, 409 and 500 are added with the shared error schema.

use http::{Method, StatusCode};
use indexmap::IndexMap;
use lite_core::{
    media, Describe, FieldDescriptor, HttpError, Location, RegistrationError, RequestDescriptor,
    TypeShape,
};

use crate::error::{DocsError, DocsResult};
use crate::openapi::{
    Contact, Info, License, MediaType, OpenApi, Operation, Parameter, ParameterIn, PathItem,
    RefOr, Reference, RequestBody, Response, Schema, SecurityScheme, Server, Tag,
};
use crate::schema::SchemaGenerator;

/// Statuses documented on every operation.
pub const DEFAULT_ERROR_STATUSES: [StatusCode; 5] = [
    StatusCode::BAD_REQUEST,
    StatusCode::UNAUTHORIZED,
    StatusCode::NOT_FOUND,
    StatusCode::CONFLICT,
    StatusCode::INTERNAL_SERVER_ERROR,
];

/// Content types advertised by every error response.
pub const ERROR_CONTENT_TYPES: [&str; 3] = [
    media::APPLICATION_JSON,
    media::APPLICATION_XML,
    media::MULTIPART_FORM_DATA,
];

/// Success status of a method: POST is 201, DELETE is 204, everything else 200.
#[must_use]
pub fn default_status(method: &Method) -> StatusCode {
    match *method {
        Method::POST => StatusCode::CREATED,
        Method::DELETE => StatusCode::NO_CONTENT,
        _ => StatusCode::OK,
    }
}

/// Everything the generator needs to know about one route.
#[derive(Debug, Clone, Copy)]
pub struct RouteDoc<'a> {
    /// HTTP method.
    pub method: &'a Method,
    /// Route template as registered, e.g. `/foo/:id`.
    pub template: &'a str,
    /// OpenAPI form of the template, e.g. `/foo/{id}`.
    pub canonical: &'a str,
    /// Compiled request type, `None` for handlers without input.
    pub request: Option<&'a RequestDescriptor>,
    /// Shape of the response type.
    pub response: &'a TypeShape,
    /// Declared response content type.
    pub response_content_type: &'a str,
}

/// Builds an OpenAPI document route by route.
///
/// ```rust
/// use http::Method;
/// use lite_core::{Describe, RequestDescriptor};
/// use lite_docs::{OpenApiGenerator, RouteDoc};
///
/// let mut generator = OpenApiGenerator::new().title("Pets").version("1.0.0");
/// generator
///     .register(&RouteDoc {
///         method: &Method::GET,
///         template: "/ping",
///         canonical: "/ping",
///         request: None,
///         response: &String::shape(),
///         response_content_type: "text/plain",
///     })
///     .unwrap();
///
/// let yaml = generator.to_yaml().unwrap();
/// assert!(yaml.contains("operationId: GET/ping"));
/// ```
#[derive(Debug, Clone)]
pub struct OpenApiGenerator {
    doc: OpenApi,
}

impl Default for OpenApiGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenApiGenerator {
    /// Creates a generator with default metadata.
    #[must_use]
    pub fn new() -> Self {
        Self {
            doc: OpenApi::new(Info::default()),
        }
    }

    /// Set the API title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.doc.info.title = title.into();
        self
    }

    /// Set the API version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.doc.info.version = version.into();
        self
    }

    /// Set the API description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.doc.info.description = Some(description.into());
        self
    }

    /// Set the terms of service URL.
    #[must_use]
    pub fn terms_of_service(mut self, url: impl Into<String>) -> Self {
        self.doc.info.terms_of_service = Some(url.into());
        self
    }

    /// Set contact information.
    #[must_use]
    pub fn contact(mut self, contact: Contact) -> Self {
        self.doc.info.contact = Some(contact);
        self
    }

    /// Set license information.
    #[must_use]
    pub fn license(mut self, name: impl Into<String>, url: Option<String>) -> Self {
        self.doc.info.license = Some(License {
            name: name.into(),
            url,
        });
        self
    }

    /// Add a server.
    #[must_use]
    pub fn server(mut self, url: impl Into<String>, description: Option<String>) -> Self {
        self.doc.servers.push(Server {
            url: url.into(),
            description,
        });
        self
    }

    /// Add a top-level tag.
    #[must_use]
    pub fn tag(mut self, name: impl Into<String>, description: Option<String>) -> Self {
        self.doc.tags.push(Tag {
            name: name.into(),
            description,
        });
        self
    }

    /// The document built so far.
    #[must_use]
    pub fn document(&self) -> &OpenApi {
        &self.doc
    }

    /// Consumes the generator.
    #[must_use]
    pub fn into_document(self) -> OpenApi {
        self.doc
    }

    /// Operation of a registered route.
    pub fn operation_mut(&mut self, canonical: &str, method: &Method) -> Option<&mut Operation> {
        self.doc.operation_mut(canonical, method)
    }

    /// Documents a route.
    ///
    /// On failure the document is left as it was. Methods without an OpenAPI
    /// 3.0 slot (CONNECT) are accepted and left undocumented.
    pub fn register(&mut self, route: &RouteDoc<'_>) -> DocsResult<()> {
        let operation_id = format!("{}{}", route.method, route.template);
        let occupied = self
            .doc
            .paths
            .get(route.canonical)
            .and_then(|item| item.operation(route.method))
            .is_some();
        if occupied {
            return Err(DocsError::InvalidOperation {
                operation_id,
                reason: "already documented".to_string(),
            });
        }

        let checkpoint = (
            self.doc.components.schemas.len(),
            self.doc.components.parameters.len(),
            self.doc.components.security_schemes.len(),
        );
        let operation = match self.build_operation(operation_id, route) {
            Ok(operation) => operation,
            Err(err) => {
                self.rollback(checkpoint);
                return Err(err.into());
            }
        };
        if !PathItem::supports(route.method) {
            self.rollback(checkpoint);
            return Ok(());
        }

        let item = self.doc.paths.entry(route.canonical.to_string()).or_default();
        if let Some(slot) = item.slot_mut(route.method) {
            *slot = Some(operation);
        }
        Ok(())
    }

    fn rollback(&mut self, (schemas, parameters, security_schemes): (usize, usize, usize)) {
        self.doc.components.schemas.truncate(schemas);
        self.doc.components.parameters.truncate(parameters);
        self.doc.components.security_schemes.truncate(security_schemes);
    }

    /// Adds a default error response to a registered operation.
    pub fn add_error_response(
        &mut self,
        canonical: &str,
        method: &Method,
        status: StatusCode,
    ) -> DocsResult<()> {
        let response = self.error_response(status)?;
        if let Some(op) = self.doc.operation_mut(canonical, method) {
            op.responses.insert(status.as_u16().to_string(), response);
        }
        Ok(())
    }

    /// Serializes the document to YAML.
    pub fn to_yaml(&self) -> DocsResult<String> {
        Ok(serde_yaml::to_string(&self.doc)?)
    }

    /// Serializes the document to pretty JSON.
    pub fn to_json(&self) -> DocsResult<String> {
        Ok(serde_json::to_string_pretty(&self.doc)?)
    }

    /// Writes the YAML document to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> DocsResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    fn build_operation(
        &mut self,
        operation_id: String,
        route: &RouteDoc<'_>,
    ) -> Result<Operation, RegistrationError> {
        let mut op = Operation::new(operation_id);

        if let Some(request) = route.request {
            for field in request.leaves() {
                self.document_field(&mut op, field)?;
            }
        }

        let status = default_status(route.method);
        let mut success = Response {
            description: reason(status),
            content: IndexMap::new(),
        };
        if !matches!(route.response.unwrap_optional(), TypeShape::Unit) {
            let schema = self.schema(route.response, || "response".to_string())?;
            success
                .content
                .insert(route.response_content_type.to_string(), MediaType { schema });
        }
        op.responses.insert(status.as_u16().to_string(), success);

        for status in DEFAULT_ERROR_STATUSES {
            let response = self.error_response(status)?;
            op.responses.insert(status.as_u16().to_string(), response);
        }
        Ok(op)
    }

    fn document_field(
        &mut self,
        op: &mut Operation,
        field: &FieldDescriptor,
    ) -> Result<(), RegistrationError> {
        let (location, name) = match &field.location {
            Location::Path { name } => (ParameterIn::Path, name),
            Location::Query { name } => (ParameterIn::Query, name),
            Location::Cookie { name } => (ParameterIn::Cookie, name),
            Location::Header { name, auth: None } => (ParameterIn::Header, name),
            Location::Header {
                auth: Some(auth), ..
            } => {
                self.doc.components.security_schemes.insert(
                    auth.name.clone(),
                    SecurityScheme {
                        scheme_type: "http".to_string(),
                        scheme: auth.scheme.clone(),
                    },
                );
                if !op.security.iter().any(|s| s.contains_key(&auth.name)) {
                    op.security
                        .push(IndexMap::from([(auth.name.clone(), Vec::new())]));
                }
                return Ok(());
            }
            Location::Body { content_type } => {
                let schema = self.schema(&field.shape, || format!("body field `{}`", field.ident))?;
                let mut content = IndexMap::new();
                content.insert(content_type.clone(), MediaType { schema });
                op.request_body = Some(RequestBody {
                    content,
                    required: field.required,
                });
                return Ok(());
            }
            // leaves() never yields embedded fields
            Location::Embedded(_) => return Ok(()),
        };

        let schema = self.schema(&field.shape, || format!("{} parameter `{name}`", location.as_str()))?;
        let parameter = Parameter {
            name: name.clone(),
            location,
            required: field.required,
            schema,
        };
        let key = self.parameter_key(&parameter);
        self.doc
            .components
            .parameters
            .entry(key.clone())
            .or_insert(parameter);
        op.parameters
            .push(RefOr::Ref(Reference::component("parameters", &key)));
        Ok(())
    }

    /// Parameters are keyed by name. A name already taken by a different
    /// parameter (other location, requiredness or schema) is keyed
    /// `{in}-{name}`, then `{in}-{name}-2`, `{in}-{name}-3` and so on.
    fn parameter_key(&self, parameter: &Parameter) -> String {
        let registered = &self.doc.components.parameters;
        let base = format!("{}-{}", parameter.location.as_str(), parameter.name);
        std::iter::once(parameter.name.clone())
            .chain(std::iter::once(base.clone()))
            .chain((2_usize..).map(|n| format!("{base}-{n}")))
            .find(|key| registered.get(key).map_or(true, |existing| existing == parameter))
            .unwrap_or(base)
    }

    fn schema(
        &mut self,
        shape: &TypeShape,
        context: impl FnOnce() -> String,
    ) -> Result<Schema, RegistrationError> {
        SchemaGenerator::new(&mut self.doc.components.schemas)
            .schema_for(shape)
            .map_err(|reason| RegistrationError::Schema {
                context: context(),
                reason,
            })
    }

    fn error_response(&mut self, status: StatusCode) -> Result<Response, RegistrationError> {
        let schema = self.schema(&HttpError::shape(), || "error response".to_string())?;
        let content = ERROR_CONTENT_TYPES
            .iter()
            .map(|ct| {
                let media = MediaType {
                    schema: schema.clone(),
                };
                (ct.to_string(), media)
            })
            .collect();
        Ok(Response {
            description: reason(status),
            content,
        })
    }
}

fn reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Response").to_string()
}
