//! Application builder and route registry.
//!
//! Every registration does two things: it compiles the handler's request
//! descriptor and files the erased handler in the route table, and it
//! documents the route in the OpenAPI generator. A route that cannot be
//! documented is not registered.

use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use lite_config::LiteConfig;
use lite_core::media::{APPLICATION_JSON, APPLICATION_OCTET_STREAM};
use lite_core::{Describe, MediaTypes, RegistrationError, TypeShape};
use lite_docs::{
    default_status, Contact, OpenApiGenerator, Operation, RouteDoc, DEFAULT_SWAGGER_URL,
    DEFAULT_YAML_URL,
};
use lite_extract::{MultipartConfig, RequestValidator};
use lite_router::{PathPattern, Router};
use tracing::debug;

use crate::error::{ServerError, ServerResult};
use crate::handler::{ErasedHandler, Handler};
use crate::middleware::Middleware;

/// Default location of the saved YAML document.
pub const DEFAULT_SPEC_FILE: &str = "doc/openapi.yaml";

/// Default listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Server and documentation settings of an [`App`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub(crate) addr: String,
    pub(crate) swagger_url: String,
    pub(crate) yaml_url: String,
    pub(crate) spec_file: String,
    pub(crate) disable_swagger: bool,
    pub(crate) disable_local_save: bool,
    pub(crate) shutdown_timeout: Duration,
    pub(crate) request_timeout: Option<Duration>,
    pub(crate) max_body_bytes: usize,
    pub(crate) multipart: MultipartConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            swagger_url: DEFAULT_SWAGGER_URL.to_string(),
            yaml_url: DEFAULT_YAML_URL.to_string(),
            spec_file: DEFAULT_SPEC_FILE.to_string(),
            disable_swagger: false,
            disable_local_save: false,
            shutdown_timeout: Duration::from_secs(30),
            request_timeout: None,
            max_body_bytes: 10 * 1024 * 1024,
            multipart: MultipartConfig::default(),
        }
    }
}

pub(crate) struct RouteSlot {
    pub(crate) method: Method,
    pub(crate) canonical: String,
    pub(crate) handler: ErasedHandler,
    pub(crate) content_type: String,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
}

/// A lite application: routes, middleware and the OpenAPI document.
///
/// ```rust
/// use lite_server::{App, ContextNoRequest};
///
/// async fn ping(_cx: ContextNoRequest) -> Result<String, std::convert::Infallible> {
///     Ok("pong".to_string())
/// }
///
/// let mut app = App::new().docs(|d| d.title("Ping"));
/// app.get("/ping", ping).summary("Liveness probe");
///
/// let yaml = app.openapi_yaml().unwrap();
/// assert!(yaml.contains("summary: Liveness probe"));
/// ```
pub struct App {
    pub(crate) routes: Vec<RouteSlot>,
    pub(crate) router: Router<usize>,
    pub(crate) docs: OpenApiGenerator,
    pub(crate) media: MediaTypes,
    pub(crate) validator: Option<Arc<dyn RequestValidator>>,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
    pub(crate) settings: Settings,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Creates an app with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            router: Router::new(),
            docs: OpenApiGenerator::new(),
            media: MediaTypes::new(),
            validator: None,
            middleware: Vec::new(),
            settings: Settings::default(),
        }
    }

    /// Creates an app from loaded configuration.
    #[must_use]
    pub fn from_config(config: &LiteConfig) -> Self {
        let docs = &config.docs;
        let mut app = Self::new()
            .addr(&config.server.addr)
            .shutdown_timeout(Duration::from_secs(config.server.shutdown_timeout_secs))
            .max_body_bytes(config.server.max_body_bytes)
            .swagger_url(&docs.swagger_url)
            .yaml_url(&docs.yaml_url)
            .spec_file(&docs.spec_file)
            .disable_swagger(docs.disable_swagger)
            .disable_local_save(docs.disable_local_save);
        app.settings.request_timeout = config.server.request_timeout_ms.map(Duration::from_millis);

        app.docs(|mut generator| {
            generator = generator.title(&docs.title).version(&docs.version);
            if let Some(description) = &docs.description {
                generator = generator.description(description);
            }
            if let Some(terms) = &docs.terms_of_service {
                generator = generator.terms_of_service(terms);
            }
            if let Some(contact) = &docs.contact {
                generator = generator.contact(Contact {
                    name: contact.name.clone(),
                    url: contact.url.clone(),
                    email: contact.email.clone(),
                });
            }
            if let Some(license) = &docs.license {
                generator = generator.license(&license.name, license.url.clone());
            }
            for server in &docs.servers {
                generator = generator.server(&server.url, server.description.clone());
            }
            for tag in &docs.tags {
                generator = generator.tag(&tag.name, tag.description.clone());
            }
            generator
        })
    }

    /// Edits document metadata: title, version, contact, servers, tags.
    #[must_use]
    pub fn docs(mut self, edit: impl FnOnce(OpenApiGenerator) -> OpenApiGenerator) -> Self {
        self.docs = edit(std::mem::take(&mut self.docs));
        self
    }

    /// Listen address used by [`App::run`].
    #[must_use]
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.settings.addr = addr.into();
        self
    }

    /// URL of the Swagger UI page.
    #[must_use]
    pub fn swagger_url(mut self, url: impl Into<String>) -> Self {
        self.settings.swagger_url = url.into();
        self
    }

    /// URL of the YAML document.
    #[must_use]
    pub fn yaml_url(mut self, url: impl Into<String>) -> Self {
        self.settings.yaml_url = url.into();
        self
    }

    /// Where [`App::run`] saves the YAML document.
    #[must_use]
    pub fn spec_file(mut self, path: impl Into<String>) -> Self {
        self.settings.spec_file = path.into();
        self
    }

    /// Stops serving the Swagger UI page.
    #[must_use]
    pub fn disable_swagger(mut self, disable: bool) -> Self {
        self.settings.disable_swagger = disable;
        self
    }

    /// Stops saving the YAML document at startup.
    #[must_use]
    pub fn disable_local_save(mut self, disable: bool) -> Self {
        self.settings.disable_local_save = disable;
        self
    }

    /// Time given to open connections on shutdown.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.settings.shutdown_timeout = timeout;
        self
    }

    /// Upper bound on handling one request, middleware included.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.settings.request_timeout = Some(timeout);
        self
    }

    /// Largest accepted request body.
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.settings.max_body_bytes = limit;
        self
    }

    /// Limits for multipart bodies.
    #[must_use]
    pub fn multipart(mut self, config: MultipartConfig) -> Self {
        self.settings.multipart = config;
        self
    }

    /// Validator run on request types marked `#[lite(validate)]`.
    #[must_use]
    pub fn validator(mut self, validator: impl RequestValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Content-type registry shared by request decoding and response encoding.
    pub fn media_types_mut(&mut self) -> &mut MediaTypes {
        &mut self.media
    }

    /// Adds middleware that runs for every route, before route middleware.
    pub fn layer(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Registered settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Registers a route.
    ///
    /// # Panics
    ///
    /// Panics with the registration error if the route is rejected; see
    /// [`App::try_route`].
    pub fn route<H, M>(&mut self, method: Method, path: &str, handler: H) -> Route<'_>
    where
        H: Handler<M>,
    {
        match self.try_route(method, path, handler, Vec::new()) {
            Ok(route) => route,
            Err(err) => panic!("{err}"),
        }
    }

    /// Registers a route whose middleware runs after the app's.
    ///
    /// # Panics
    ///
    /// Panics with the registration error if the route is rejected.
    pub fn route_with<H, M>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Route<'_>
    where
        H: Handler<M>,
    {
        match self.try_route(method, path, handler, middleware) {
            Ok(route) => route,
            Err(err) => panic!("{err}"),
        }
    }

    /// Registers a route with its own middleware, or returns why it was
    /// rejected.
    pub fn try_route<H, M>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> ServerResult<Route<'_>>
    where
        H: Handler<M>,
    {
        let descriptor = H::describe()?;
        let pattern = PathPattern::parse(path).map_err(|e| RegistrationError::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        match &descriptor {
            Some(descriptor) => descriptor.check_path_parameters(path, pattern.names())?,
            None if !pattern.names().is_empty() => {
                return Err(RegistrationError::PathArity {
                    path: path.to_string(),
                    template: pattern.names().len(),
                    declared: 0,
                }
                .into())
            }
            None => {}
        }

        if self.router.contains(&method, &pattern) {
            return Err(RegistrationError::DuplicateRoute {
                method: method.to_string(),
                path: path.to_string(),
            }
            .into());
        }

        let index = self.routes.len();
        self.router
            .insert(method.clone(), path, index)
            .map_err(|e| RegistrationError::InvalidPath {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let response = <H::Response as Describe>::shape();
        let content_type = default_content_type(&response);
        let documented = self.docs.register(&RouteDoc {
            method: &method,
            template: pattern.template(),
            canonical: pattern.canonical(),
            request: descriptor.as_ref(),
            response: &response,
            response_content_type: content_type,
        });
        if let Err(err) = documented {
            self.router.remove(&method, pattern.template());
            return Err(err.into());
        }
        self.routes.push(RouteSlot {
            method: method.clone(),
            canonical: pattern.canonical().to_string(),
            handler: handler.into_erased(descriptor),
            content_type: content_type.to_string(),
            middleware,
        });
        debug!(%method, path, "route registered");

        Ok(Route { app: self, index })
    }

    /// Registers a `GET` route.
    pub fn get<H: Handler<M>, M>(&mut self, path: &str, handler: H) -> Route<'_> {
        self.route(Method::GET, path, handler)
    }

    /// Registers a `POST` route.
    pub fn post<H: Handler<M>, M>(&mut self, path: &str, handler: H) -> Route<'_> {
        self.route(Method::POST, path, handler)
    }

    /// Registers a `PUT` route.
    pub fn put<H: Handler<M>, M>(&mut self, path: &str, handler: H) -> Route<'_> {
        self.route(Method::PUT, path, handler)
    }

    /// Registers a `PATCH` route.
    pub fn patch<H: Handler<M>, M>(&mut self, path: &str, handler: H) -> Route<'_> {
        self.route(Method::PATCH, path, handler)
    }

    /// Registers a `DELETE` route.
    pub fn delete<H: Handler<M>, M>(&mut self, path: &str, handler: H) -> Route<'_> {
        self.route(Method::DELETE, path, handler)
    }

    /// Registers a `HEAD` route.
    pub fn head<H: Handler<M>, M>(&mut self, path: &str, handler: H) -> Route<'_> {
        self.route(Method::HEAD, path, handler)
    }

    /// Registers an `OPTIONS` route.
    pub fn options<H: Handler<M>, M>(&mut self, path: &str, handler: H) -> Route<'_> {
        self.route(Method::OPTIONS, path, handler)
    }

    /// Registers a `TRACE` route.
    pub fn trace<H: Handler<M>, M>(&mut self, path: &str, handler: H) -> Route<'_> {
        self.route(Method::TRACE, path, handler)
    }

    /// Registers a `CONNECT` route. It is served but not documented.
    pub fn connect<H: Handler<M>, M>(&mut self, path: &str, handler: H) -> Route<'_> {
        self.route(Method::CONNECT, path, handler)
    }

    /// The OpenAPI document as YAML.
    pub fn openapi_yaml(&self) -> ServerResult<String> {
        Ok(self.docs.to_yaml()?)
    }

    /// The OpenAPI document as JSON.
    pub fn openapi_json(&self) -> ServerResult<String> {
        Ok(self.docs.to_json()?)
    }

    /// Writes the YAML document to the configured spec file.
    pub fn save_openapi(&self) -> ServerResult<()> {
        Ok(self.docs.save(&self.settings.spec_file)?)
    }
}

/// Handle to a registered route, for editing its documentation.
pub struct Route<'a> {
    app: &'a mut App,
    index: usize,
}

impl Route<'_> {
    fn edit(&mut self, f: impl FnOnce(&mut Operation)) -> &mut Self {
        let slot = &self.app.routes[self.index];
        if let Some(op) = self
            .app
            .docs
            .operation_mut(&slot.canonical, &slot.method)
        {
            f(op);
        }
        self
    }

    /// Sets the operation description.
    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        let description = description.into();
        self.edit(|op| op.description = Some(description))
    }

    /// Sets the operation summary.
    pub fn summary(&mut self, summary: impl Into<String>) -> &mut Self {
        let summary = summary.into();
        self.edit(|op| op.summary = Some(summary))
    }

    /// Replaces the generated operation id.
    pub fn operation_id(&mut self, id: impl Into<String>) -> &mut Self {
        let id = id.into();
        self.edit(|op| op.operation_id = id)
    }

    /// Marks the operation deprecated.
    pub fn deprecated(&mut self) -> &mut Self {
        self.edit(|op| op.deprecated = true)
    }

    /// Appends tags to the operation.
    pub fn add_tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.edit(|op| op.tags.extend(tags))
    }

    /// Changes the success content type, in the document and at runtime.
    /// Error responses keep their content types.
    pub fn set_response_content_type(&mut self, content_type: impl Into<String>) -> &mut Self {
        let content_type = content_type.into();
        let slot = &mut self.app.routes[self.index];
        slot.content_type = content_type.clone();
        let status = default_status(&slot.method).as_u16().to_string();
        self.edit(|op| op.set_response_content_type(&status, &content_type))
    }

    /// Documents an extra error status with the default error bodies.
    ///
    /// # Panics
    ///
    /// Panics if the error schema cannot be generated.
    pub fn add_error_response(&mut self, status: StatusCode) -> &mut Self {
        let slot = &self.app.routes[self.index];
        let (canonical, method) = (slot.canonical.clone(), slot.method.clone());
        if let Err(err) = self
            .app
            .docs
            .add_error_response(&canonical, &method, status)
        {
            panic!("{err}");
        }
        self
    }

    /// Adds middleware that runs for this route only.
    pub fn layer(&mut self, middleware: impl Middleware) -> &mut Self {
        self.app.routes[self.index].middleware.push(Arc::new(middleware));
        self
    }
}

fn default_content_type(shape: &TypeShape) -> &'static str {
    match shape.unwrap_optional() {
        TypeShape::Bytes => APPLICATION_OCTET_STREAM,
        _ => APPLICATION_JSON,
    }
}
