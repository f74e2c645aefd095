//! Middleware chain.
//!
//! Middleware sees every request before the handler and every response
//! after it. Global middleware attached with [`App::layer`](crate::App::layer)
//! runs first, then the middleware of the matched route, then the handler.
//!
//! # Example
//!
//! ```rust
//! use lite_server::{FnMiddleware, Next, Request};
//!
//! let timing = FnMiddleware::new("timing", |request: Request, next: Next| async move {
//!     let started = std::time::Instant::now();
//!     let response = next.run(request).await;
//!     tracing::debug!(elapsed = ?started.elapsed(), "handled");
//!     response
//! });
//! # let _ = timing;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;

/// Request passed through the chain. The body is fully buffered.
pub type Request = http::Request<Bytes>;

/// Response produced by handlers and middleware.
pub type Response = http::Response<Full<Bytes>>;

/// A boxed future that returns a response.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Terminal step of a chain.
pub(crate) type Endpoint = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// A request/response interceptor.
///
/// Implementations call [`Next::run`] to continue, or return their own
/// response to short-circuit the chain.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Handles the request.
    fn process(&self, request: Request, next: Next) -> BoxFuture<'static, Response>;
}

/// The rest of the chain.
pub struct Next {
    chain: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    endpoint: Endpoint,
}

impl Next {
    pub(crate) fn new(chain: Arc<[Arc<dyn Middleware>]>, endpoint: Endpoint) -> Self {
        Self {
            chain,
            index: 0,
            endpoint,
        }
    }

    /// Runs the next middleware, or the handler once the chain is exhausted.
    pub fn run(mut self, request: Request) -> BoxFuture<'static, Response> {
        match self.chain.get(self.index).cloned() {
            Some(middleware) => {
                self.index += 1;
                tracing::trace!(middleware = middleware.name(), "entering middleware");
                middleware.process(request, self)
            }
            None => (self.endpoint)(request),
        }
    }
}

/// Middleware built from an async closure.
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Wraps `func` under `name`.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&self, request: Request, next: Next) -> BoxFuture<'static, Response> {
        Box::pin((self.func)(request, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, StatusCode};
    use http_body_util::BodyExt;
    use parking_lot::Mutex;

    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process(&self, request: Request, next: Next) -> BoxFuture<'static, Response> {
            self.seen.lock().push(self.name);
            next.run(request)
        }
    }

    fn endpoint(seen: Arc<Mutex<Vec<&'static str>>>) -> Endpoint {
        Arc::new(move |_request| {
            seen.lock().push("handler");
            Box::pin(async { Response::new(Full::new(Bytes::from_static(b"ok"))) })
        })
    }

    fn request() -> Request {
        http::Request::builder().uri("/").body(Bytes::new()).unwrap()
    }

    #[tokio::test]
    async fn runs_in_order_then_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let chain: Arc<[Arc<dyn Middleware>]> = Arc::from(vec![
            Arc::new(Recorder { name: "global", seen: seen.clone() }) as Arc<dyn Middleware>,
            Arc::new(Recorder { name: "route", seen: seen.clone() }),
        ]);

        let response = Next::new(chain, endpoint(seen.clone())).run(request()).await;
        let body = response.into_body().collect().await.unwrap().to_bytes();

        assert_eq!(&body[..], b"ok");
        assert_eq!(*seen.lock(), vec!["global", "route", "handler"]);
    }

    #[tokio::test]
    async fn closures_can_short_circuit_or_decorate() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let deny = FnMiddleware::new("deny", |_request: Request, _next: Next| async {
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::FORBIDDEN;
            response
        });
        let chain: Arc<[Arc<dyn Middleware>]> = Arc::from(vec![Arc::new(deny) as Arc<dyn Middleware>]);
        let response = Next::new(chain, endpoint(seen.clone())).run(request()).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(seen.lock().is_empty());

        let tag = FnMiddleware::new("tag", |request: Request, next: Next| async move {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert("x-tag", HeaderValue::from_static("1"));
            response
        });
        assert_eq!(tag.name(), "tag");
        let chain: Arc<[Arc<dyn Middleware>]> = Arc::from(vec![Arc::new(tag) as Arc<dyn Middleware>]);
        let response = Next::new(chain, endpoint(seen.clone())).run(request()).await;
        assert_eq!(response.headers()["x-tag"], "1");
        assert_eq!(*seen.lock(), vec!["handler"]);
    }
}
