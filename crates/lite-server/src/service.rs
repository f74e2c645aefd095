//! Request dispatch.
//!
//! [`App::into_service`] freezes the route table into a [`LiteService`]:
//! a cheaply cloneable value that turns one HTTP request into one response.
//! The server loop drives it over hyper connections and the test client
//! calls it directly.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderValue, ALLOW};
use http::{HeaderMap, Method, StatusCode};
use http_body_util::{BodyExt, Limited};
use lite_core::media::{APPLICATION_JSON, TEXT_HTML};
use lite_core::HttpError;
use lite_docs::{default_status, SwaggerUi};
use lite_extract::serialize_error;
use lite_router::Router;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

use crate::app::App;
use crate::context::RequestId;
use crate::error::ServerResult;
use crate::handler::{build, Invocation, Runtime};
use crate::middleware::{Endpoint, Middleware, Next, Request, Response};

/// Header carrying the request id on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const APPLICATION_YAML: &str = "application/yaml";

struct FrozenRoute {
    endpoint: Endpoint,
    chain: Arc<[Arc<dyn Middleware>]>,
}

struct Shared {
    routes: Vec<FrozenRoute>,
    router: Router<usize>,
    runtime: Arc<Runtime>,
    yaml_url: String,
    yaml: Bytes,
    swagger: Option<(String, Bytes)>,
    request_timeout: Option<Duration>,
    max_body_bytes: usize,
}

/// A frozen application, ready to serve requests.
#[derive(Clone)]
pub struct LiteService {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for LiteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiteService")
            .field("routes", &self.shared.routes.len())
            .field("yaml_url", &self.shared.yaml_url)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Freezes the app into a service. The OpenAPI document is rendered
    /// once, here.
    pub fn into_service(self) -> ServerResult<LiteService> {
        let yaml = Bytes::from(self.docs.to_yaml()?);
        let settings = self.settings;
        let swagger = (!settings.disable_swagger).then(|| {
            let page = SwaggerUi::new(&settings.yaml_url, &self.docs.document().info.title);
            (settings.swagger_url.clone(), Bytes::from(page.html()))
        });

        let runtime = Arc::new(Runtime {
            media: Arc::new(self.media),
            validator: self.validator,
            multipart: settings.multipart.clone(),
        });

        let routes = self
            .routes
            .into_iter()
            .map(|slot| {
                let invocation = Invocation {
                    runtime: Arc::clone(&runtime),
                    status: default_status(&slot.method),
                    content_type: Arc::from(slot.content_type.as_str()),
                };
                let handler = slot.handler;
                let endpoint: Endpoint =
                    Arc::new(move |request| handler(request, invocation.clone()));
                let chain: Vec<Arc<dyn Middleware>> = self
                    .middleware
                    .iter()
                    .cloned()
                    .chain(slot.middleware)
                    .collect();
                FrozenRoute {
                    endpoint,
                    chain: Arc::from(chain),
                }
            })
            .collect();

        Ok(LiteService {
            shared: Arc::new(Shared {
                routes,
                router: self.router,
                runtime,
                yaml_url: settings.yaml_url,
                yaml,
                swagger,
                request_timeout: settings.request_timeout,
                max_body_bytes: settings.max_body_bytes,
            }),
        })
    }
}

impl LiteService {
    /// Handles one request.
    ///
    /// The body is read up to the configured limit before routing.
    pub async fn handle<B>(&self, request: http::Request<B>) -> Response
    where
        B: hyper::body::Body<Data = Bytes> + Send,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        let request_id = Uuid::now_v7().to_string();
        let span = info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
        );
        let mut response = self.dispatch(request, request_id.clone()).instrument(span).await;
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }

    async fn dispatch<B>(&self, request: http::Request<B>, request_id: String) -> Response
    where
        B: hyper::body::Body<Data = Bytes> + Send,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        let shared = &self.shared;
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        if method == Method::GET {
            if path == shared.yaml_url {
                return build(
                    StatusCode::OK,
                    Some(APPLICATION_YAML),
                    HeaderMap::new(),
                    shared.yaml.clone(),
                );
            }
            if let Some((url, html)) = &shared.swagger {
                if path == *url {
                    return build(StatusCode::OK, Some(TEXT_HTML), HeaderMap::new(), html.clone());
                }
            }
        }

        let Some(found) = shared.router.find(&method, &path) else {
            let allowed = shared.router.allowed_methods(&path);
            if allowed.is_empty() {
                debug!("no route");
                return self.error(&HttpError::not_found(format!("no route for {path}")));
            }
            let mut response = self.error(&HttpError::new(
                StatusCode::METHOD_NOT_ALLOWED,
                format!("{method} is not allowed on {path}"),
            ));
            let allow = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(ALLOW, value);
            }
            return response;
        };
        let route = &shared.routes[*found.value];
        let params = found.params;

        let (mut parts, body) = request.into_parts();
        let body = match Limited::new(body, shared.max_body_bytes).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.is::<http_body_util::LengthLimitError>() => {
                warn!(limit = shared.max_body_bytes, "request body too large");
                return self.error(&HttpError::new(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("request body exceeds {} bytes", shared.max_body_bytes),
                ));
            }
            Err(err) => {
                return self.error(&HttpError::bad_request(format!(
                    "failed to read request body: {err}"
                )));
            }
        };
        parts.extensions.insert(params);
        parts.extensions.insert(RequestId(request_id));
        let request = Request::from_parts(parts, body);

        let next = Next::new(Arc::clone(&route.chain), Arc::clone(&route.endpoint));
        match shared.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, next.run(request)).await {
                Ok(response) => response,
                Err(_) => {
                    warn!(timeout = ?limit, "request timed out");
                    self.error(&HttpError::new(
                        StatusCode::GATEWAY_TIMEOUT,
                        "request timed out",
                    ))
                }
            },
            None => next.run(request).await,
        }
    }

    fn error(&self, err: &HttpError) -> Response {
        let (content_type, body) =
            serialize_error(err, Some(APPLICATION_JSON), &self.shared.runtime.media);
        build(err.status_code(), Some(content_type), HeaderMap::new(), body)
    }

    /// The rendered OpenAPI YAML document.
    #[must_use]
    pub fn openapi_yaml(&self) -> &[u8] {
        &self.shared.yaml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContextNoRequest, FnMiddleware, Next};
    use http_body_util::Full;

    async fn hello(_cx: ContextNoRequest) -> Result<String, HttpError> {
        Ok("hello".to_string())
    }

    async fn slow(_cx: ContextNoRequest) -> Result<(), HttpError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }

    async fn call(service: &LiteService, method: Method, uri: &str, body: &'static [u8]) -> Response {
        let request = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from_static(body)))
            .unwrap();
        service.handle(request).await
    }

    async fn body(response: Response) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn serves_routes_and_built_ins() {
        let mut app = App::new();
        app.get("/hello", hello);
        let service = app.into_service().unwrap();

        let response = call(&service, Method::GET, "/hello", b"").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(&body(response).await[..], b"\"hello\"");

        let response = call(&service, Method::GET, "/swagger/openapi.yaml", b"").await;
        assert_eq!(response.headers()["content-type"], APPLICATION_YAML);
        let yaml = body(response).await;
        assert!(std::str::from_utf8(&yaml).unwrap().contains("/hello"));

        let response = call(&service, Method::GET, "/swagger", b"").await;
        assert_eq!(response.headers()["content-type"], TEXT_HTML);
        assert!(std::str::from_utf8(&body(response).await)
            .unwrap()
            .contains("/swagger/openapi.yaml"));
    }

    #[tokio::test]
    async fn disabled_swagger_keeps_the_yaml() {
        let mut app = App::new().disable_swagger(true);
        app.get("/hello", hello);
        let service = app.into_service().unwrap();

        let response = call(&service, Method::GET, "/swagger", b"").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = call(&service, Method::GET, "/swagger/openapi.yaml", b"").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_paths_and_methods() {
        let mut app = App::new();
        app.get("/hello", hello);
        let service = app.into_service().unwrap();

        let response = call(&service, Method::GET, "/nope", b"").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["content-type"], APPLICATION_JSON);

        let response = call(&service, Method::POST, "/hello", b"").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET");
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() {
        let mut app = App::new().max_body_bytes(4);
        app.post("/hello", hello);
        let service = app.into_service().unwrap();

        let response = call(&service, Method::POST, "/hello", b"0123456789").await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let response = call(&service, Method::POST, "/hello", b"0123").await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn global_middleware_runs_before_route_middleware() {
        let mut app = App::new();
        app.layer(FnMiddleware::new("outer", |request: Request, next: Next| async move {
            let mut response = next.run(request).await;
            let seen = response
                .headers()
                .get("x-trail")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            response
                .headers_mut()
                .insert("x-trail", HeaderValue::from_str(&format!("{seen},outer")).unwrap());
            response
        }));
        app.get("/hello", hello)
            .layer(FnMiddleware::new("inner", |request: Request, next: Next| async move {
                assert!(request.extensions().get::<RequestId>().is_some());
                let mut response = next.run(request).await;
                response
                    .headers_mut()
                    .insert("x-trail", HeaderValue::from_static("inner"));
                response
            }));
        let service = app.into_service().unwrap();

        let response = call(&service, Method::GET, "/hello", b"").await;
        assert_eq!(response.headers()["x-trail"], "inner,outer");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_handlers_time_out() {
        let mut app = App::new().request_timeout(Duration::from_millis(50));
        app.get("/slow", slow);
        let service = app.into_service().unwrap();

        let response = call(&service, Method::GET, "/slow", b"").await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
