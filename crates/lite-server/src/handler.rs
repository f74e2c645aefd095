//! Handler adapter.
//!
//! Registration turns a typed handler into an [`ErasedHandler`]. Per request
//! the adapter builds the extraction context, binds and validates the
//! request, calls the handler and serializes what it returns with the
//! content type the handler left in its context.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use lite_core::{Describe, HttpError, MediaTypes, RegistrationError, RequestDescriptor};
use lite_extract::{
    bind_request, describe_request, serialize_error, serialize_response, ExtractionContext,
    LiteRequest, MultipartConfig, RequestValidator,
};
use lite_router::Params;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::error;

use crate::context::{Context, ContextNoRequest, RequestId, ResponseParts};
use crate::middleware::{BoxFuture, Request, Response};

/// State shared by every route of a running app.
pub struct Runtime {
    pub(crate) media: Arc<MediaTypes>,
    pub(crate) validator: Option<Arc<dyn RequestValidator>>,
    pub(crate) multipart: MultipartConfig,
}

/// Per-route settings handed to an erased handler on each call.
#[derive(Clone)]
pub struct Invocation {
    pub(crate) runtime: Arc<Runtime>,
    pub(crate) status: StatusCode,
    pub(crate) content_type: Arc<str>,
}

/// A handler with its types erased.
pub type ErasedHandler = Arc<dyn Fn(Request, Invocation) -> BoxFuture<'static, Response> + Send + Sync>;

/// An async function usable as a route handler.
///
/// Implemented for `Fn(Context<Req>) -> impl Future<Output = Result<Resp, E>>`
/// and for `Fn(ContextNoRequest) -> impl Future<Output = Result<Resp, E>>`.
/// `M` only tells the two apart.
pub trait Handler<M>: Send + Sync + 'static {
    /// Success value of the handler.
    type Response: Serialize + Describe + Send + 'static;

    /// Descriptor of the request type, if the handler takes one.
    fn describe() -> Result<Option<RequestDescriptor>, RegistrationError>;

    /// Erases the handler's types.
    fn into_erased(self, descriptor: Option<RequestDescriptor>) -> ErasedHandler;
}

impl<F, Fut, Req, Resp, E> Handler<(Req,)> for F
where
    F: Fn(Context<Req>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, E>> + Send + 'static,
    Req: LiteRequest,
    Resp: Serialize + Describe + Send + 'static,
    E: Into<anyhow::Error> + 'static,
{
    type Response = Resp;

    fn describe() -> Result<Option<RequestDescriptor>, RegistrationError> {
        describe_request::<Req>().map(Some)
    }

    fn into_erased(self, descriptor: Option<RequestDescriptor>) -> ErasedHandler {
        let handler = Arc::new(self);
        let descriptor = Arc::new(descriptor.unwrap_or_default());
        Arc::new(move |request, invocation| {
            let handler = Arc::clone(&handler);
            let descriptor = Arc::clone(&descriptor);
            Box::pin(async move {
                let (mut cx, request_id) = invocation.extraction_context(request);
                let response = invocation.response_parts();

                if let Err(err) = cx.load_multipart(&invocation.runtime.multipart).await {
                    return invocation.error(&HttpError::from(err), &response);
                }
                let bound = match bind_request::<Req>(
                    &cx,
                    &descriptor,
                    invocation.runtime.validator.as_deref(),
                ) {
                    Ok(bound) => bound,
                    Err(err) => return invocation.error(&err, &response),
                };

                let context = Context::new(
                    bound,
                    ContextNoRequest::new(cx, request_id, Arc::clone(&response)),
                );
                let result = handler(context).await.map_err(Into::into);
                invocation.finish(result, &response)
            })
        })
    }
}

impl<F, Fut, Resp, E> Handler<()> for F
where
    F: Fn(ContextNoRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, E>> + Send + 'static,
    Resp: Serialize + Describe + Send + 'static,
    E: Into<anyhow::Error> + 'static,
{
    type Response = Resp;

    fn describe() -> Result<Option<RequestDescriptor>, RegistrationError> {
        Ok(None)
    }

    fn into_erased(self, _descriptor: Option<RequestDescriptor>) -> ErasedHandler {
        let handler = Arc::new(self);
        Arc::new(move |request, invocation| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let (cx, request_id) = invocation.extraction_context(request);
                let response = invocation.response_parts();
                let context = ContextNoRequest::new(cx, request_id, Arc::clone(&response));
                let result = handler(context).await.map_err(Into::into);
                invocation.finish(result, &response)
            })
        })
    }
}

impl Invocation {
    fn extraction_context(&self, request: Request) -> (ExtractionContext, String) {
        let (parts, body) = request.into_parts();
        let params = parts.extensions.get::<Params>().cloned().unwrap_or_default();
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default();
        let cx = ExtractionContext::new(parts.method, parts.uri, parts.headers, body, params)
            .with_media_types(Arc::clone(&self.runtime.media));
        (cx, request_id)
    }

    fn response_parts(&self) -> Arc<Mutex<ResponseParts>> {
        Arc::new(Mutex::new(ResponseParts {
            status: self.status,
            content_type: self.content_type.to_string(),
            headers: HeaderMap::new(),
        }))
    }

    fn finish<T: Serialize + Describe>(
        &self,
        result: Result<T, anyhow::Error>,
        response: &Mutex<ResponseParts>,
    ) -> Response {
        let value = match result {
            Ok(value) => value,
            Err(err) => {
                let err = into_http_error(err);
                error!(status = err.status, error = %err, "handler failed");
                return self.error(&err, response);
            }
        };

        let parts = response.lock().clone();
        match serialize_response(&value, &parts.content_type, &self.runtime.media) {
            Ok(Some(body)) => build(parts.status, Some(&parts.content_type), parts.headers, body),
            Ok(None) => build(parts.status, None, parts.headers, Bytes::new()),
            Err(err) => {
                error!(content_type = %parts.content_type, error = %err, "response serialization failed");
                self.error(&HttpError::from(err), response)
            }
        }
    }

    fn error(&self, err: &HttpError, response: &Mutex<ResponseParts>) -> Response {
        let parts = response.lock().clone();
        let (content_type, body) =
            serialize_error(err, Some(&parts.content_type), &self.runtime.media);
        build(err.status_code(), Some(content_type), parts.headers, body)
    }
}

/// Errors that already carry a status keep it. Anything else is a 500.
pub(crate) fn into_http_error(err: anyhow::Error) -> HttpError {
    match err.downcast::<HttpError>() {
        Ok(err) => err,
        Err(other) => HttpError::internal(other.to_string()),
    }
}

pub(crate) fn build(
    status: StatusCode,
    content_type: Option<&str>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(ct).ok()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_errors_keep_their_status() {
        let err = into_http_error(HttpError::not_found("no such pet").into());
        assert_eq!(err.status, 404);
        assert_eq!(err.description, "no such pet");

        let err = into_http_error(anyhow::anyhow!("database is down"));
        assert_eq!(err.status, 500);
        assert_eq!(err.description, "database is down");
    }

    #[test]
    fn build_sets_content_type_only_with_a_body() {
        let response = build(StatusCode::NO_CONTENT, None, HeaderMap::new(), Bytes::new());
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_TYPE).is_none());

        let response = build(
            StatusCode::OK,
            Some("application/json"),
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
        );
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }
}
