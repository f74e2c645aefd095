//! OpenAPI 3.0.3 document types.
//!
//! Only the parts of OpenAPI 3.0.3 the emitter produces are modelled:
//! <https://spec.openapis.org/oas/v3.0.3>

use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Version written to every document.
pub const OPENAPI_VERSION: &str = "3.0.3";

/// OpenAPI document root object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApi {
    /// OpenAPI version, always [`OPENAPI_VERSION`].
    pub openapi: String,
    /// API metadata.
    pub info: Info,
    /// Available servers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// API paths and operations, keyed by canonical path.
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    /// Reusable components.
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
    /// Tags for API grouping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl OpenApi {
    /// Creates an empty document.
    #[must_use]
    pub fn new(info: Info) -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info,
            servers: Vec::new(),
            paths: IndexMap::new(),
            components: Components::default(),
            tags: Vec::new(),
        }
    }

    /// Operation registered for `method` on a canonical path.
    pub fn operation_mut(&mut self, path: &str, method: &Method) -> Option<&mut Operation> {
        self.paths.get_mut(path)?.operation_mut(method)
    }

    /// Operation registered for `method` on a canonical path.
    #[must_use]
    pub fn operation(&self, path: &str, method: &Method) -> Option<&Operation> {
        self.paths.get(path)?.operation(method)
    }
}

/// API metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title.
    pub title: String,
    /// API description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Terms of service URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "termsOfService")]
    pub terms_of_service: Option<String>,
    /// Contact information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// License information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    /// API version.
    pub version: String,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "API".to_string(),
            description: None,
            terms_of_service: None,
            contact: None,
            license: None,
            version: "1.0.0".to_string(),
        }
    }
}

/// Contact information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// License information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// License name.
    pub name: String,
    /// License URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Server information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Server URL.
    pub url: String,
    /// Server description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// API tag for grouping operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A path item containing operations for a single path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// PUT operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// POST operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// DELETE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// OPTIONS operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// PATCH operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// TRACE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    /// Returns true if OpenAPI 3.0 has a slot for `method`.
    #[must_use]
    pub fn supports(method: &Method) -> bool {
        matches!(
            *method,
            Method::GET
                | Method::PUT
                | Method::POST
                | Method::DELETE
                | Method::OPTIONS
                | Method::HEAD
                | Method::PATCH
                | Method::TRACE
        )
    }

    /// Slot for `method`. OpenAPI 3.0 has none for CONNECT or extension methods.
    pub fn slot_mut(&mut self, method: &Method) -> Option<&mut Option<Operation>> {
        Some(match *method {
            Method::GET => &mut self.get,
            Method::PUT => &mut self.put,
            Method::POST => &mut self.post,
            Method::DELETE => &mut self.delete,
            Method::OPTIONS => &mut self.options,
            Method::HEAD => &mut self.head,
            Method::PATCH => &mut self.patch,
            Method::TRACE => &mut self.trace,
            _ => return None,
        })
    }

    /// Operation registered for `method`.
    pub fn operation_mut(&mut self, method: &Method) -> Option<&mut Operation> {
        self.slot_mut(method)?.as_mut()
    }

    /// Operation registered for `method`.
    #[must_use]
    pub fn operation(&self, method: &Method) -> Option<&Operation> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::OPTIONS => self.options.as_ref(),
            Method::HEAD => self.head.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            Method::TRACE => self.trace.as_ref(),
            _ => None,
        }
    }
}

/// An API operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Tags for grouping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Full description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unique operation identifier.
    #[serde(rename = "operationId")]
    pub operation_id: String,
    /// Parameters, as references into `components.parameters`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RefOr<Parameter>>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code.
    pub responses: IndexMap<String, Response>,
    /// Whether deprecated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Security requirements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
}

impl Operation {
    /// Creates an operation with no parameters and no responses.
    #[must_use]
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            tags: Vec::new(),
            summary: None,
            description: None,
            operation_id: operation_id.into(),
            parameters: Vec::new(),
            request_body: None,
            responses: IndexMap::new(),
            deprecated: false,
            security: Vec::new(),
        }
    }

    /// Moves the content of the `status` response under `content_type`.
    ///
    /// Does nothing if the response has no content.
    pub fn set_response_content_type(&mut self, status: &str, content_type: &str) {
        let Some(response) = self.responses.get_mut(status) else {
            return;
        };
        if let Some((_, media)) = response.content.pop() {
            response.content.clear();
            response.content.insert(content_type.to_string(), media);
        }
    }
}

/// Either an inline value or a `$ref` to a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// Reference to a component.
    Ref(Reference),
    /// Inline value.
    Item(T),
}

/// A `$ref` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Target, e.g. `#/components/schemas/Pet`.
    #[serde(rename = "$ref")]
    pub reference: String,
}

impl Reference {
    /// Reference to `#/components/{section}/{name}`.
    #[must_use]
    pub fn component(section: &str, name: &str) -> Self {
        Self {
            reference: format!("#/components/{section}/{name}"),
        }
    }
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    /// Query string parameter.
    Query,
    /// URL path parameter.
    Path,
    /// HTTP header.
    Header,
    /// Cookie.
    Cookie,
}

impl ParameterIn {
    /// Lowercase name, as used in `in:`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Path => "path",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

/// An operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter location.
    #[serde(rename = "in")]
    pub location: ParameterIn,
    /// Whether required.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Parameter schema.
    pub schema: Schema,
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Content by media type.
    pub content: IndexMap<String, MediaType>,
    /// Whether required.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

/// Media type content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type.
    pub schema: Schema,
}

/// Response definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Description (required by OpenAPI).
    pub description: String,
    /// Response content by media type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

/// Reusable components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Reusable schemas.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Schema>,
    /// Reusable parameters.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Parameter>,
    /// Security schemes.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    #[serde(rename = "securitySchemes")]
    pub security_schemes: IndexMap<String, SecurityScheme>,
}

impl Components {
    /// Returns true if every table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.parameters.is_empty() && self.security_schemes.is_empty()
    }
}

/// Security scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityScheme {
    /// Security scheme type, `http` for header credentials.
    #[serde(rename = "type")]
    pub scheme_type: String,
    /// HTTP auth scheme name, e.g. `bearer`.
    pub scheme: String,
}

/// Security requirement: scheme name to scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// JSON Schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// String type.
    String,
    /// Number type.
    Number,
    /// Integer type.
    Integer,
    /// Boolean type.
    Boolean,
    /// Array type.
    Array,
    /// Object type.
    Object,
}

/// Schema object, the OpenAPI 3.0 subset of JSON Schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Reference to another schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Schema type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,
    /// Format, e.g. `int64` or `byte`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Object properties.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    /// Required properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Array item schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Map value schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "additionalProperties")]
    pub additional_properties: Option<Box<Schema>>,
}

impl Schema {
    fn typed(schema_type: SchemaType, format: Option<&str>) -> Self {
        Self {
            schema_type: Some(schema_type),
            format: format.map(str::to_string),
            ..Default::default()
        }
    }

    /// A string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::typed(SchemaType::String, None)
    }

    /// A string schema with a format.
    #[must_use]
    pub fn string_format(format: &str) -> Self {
        Self::typed(SchemaType::String, Some(format))
    }

    /// An integer schema.
    #[must_use]
    pub fn integer(format: &str) -> Self {
        Self::typed(SchemaType::Integer, Some(format))
    }

    /// A number schema.
    #[must_use]
    pub fn number(format: &str) -> Self {
        Self::typed(SchemaType::Number, Some(format))
    }

    /// A boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::typed(SchemaType::Boolean, None)
    }

    /// An array schema with the given item schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed(SchemaType::Array, None)
        }
    }

    /// An object schema.
    #[must_use]
    pub fn object() -> Self {
        Self::typed(SchemaType::Object, None)
    }

    /// A map schema.
    #[must_use]
    pub fn map(values: Schema) -> Self {
        Self {
            additional_properties: Some(Box::new(values)),
            ..Self::object()
        }
    }

    /// A reference to `#/components/schemas/{name}`.
    #[must_use]
    pub fn component(name: &str) -> Self {
        Self {
            reference: Some(Reference::component("schemas", name).reference),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_serialize_as_dollar_ref() {
        let param: RefOr<Parameter> = RefOr::Ref(Reference::component("parameters", "id"));
        let json = serde_json::to_string(&param).unwrap();
        assert_eq!(json, r##"{"$ref":"#/components/parameters/id"}"##);
    }

    #[test]
    fn empty_collections_are_omitted() {
        let json = serde_json::to_value(Schema::string()).unwrap();
        assert_eq!(json, serde_json::json!({"type": "string"}));

        let doc = OpenApi::new(Info::default());
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("components").is_none());
        assert_eq!(json["openapi"], "3.0.3");
    }

    #[test]
    fn connect_has_no_slot() {
        let mut item = PathItem::default();
        assert!(item.slot_mut(&Method::GET).is_some());
        assert!(item.slot_mut(&Method::CONNECT).is_none());
    }

    #[test]
    fn response_content_type_is_replaced() {
        let mut op = Operation::new("GET/foo");
        let mut content = IndexMap::new();
        content.insert(
            "application/json".to_string(),
            MediaType {
                schema: Schema::string(),
            },
        );
        op.responses.insert(
            "200".to_string(),
            Response {
                description: "OK".to_string(),
                content,
            },
        );

        op.set_response_content_type("200", "application/xml");
        let keys: Vec<_> = op.responses["200"].content.keys().collect();
        assert_eq!(keys, vec!["application/xml"]);
    }
}
