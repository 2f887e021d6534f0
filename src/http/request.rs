//! Request correlation identifiers.
//!
//! # Responsibilities
//! - Reuse an inbound `X-Request-Id` verbatim when present
//! - Otherwise generate one from a nanosecond clock
//! - Attach the id to request extensions and echo it on the response
//!
//! # Design Decisions
//! - Request ID added as the outermost layer so every later layer sees it
//! - Generated ids are forced strictly increasing, so two requests landing
//!   on the same clock tick still get distinct ids

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{HeaderName, HeaderValue, Request, Response};
use tower::{Layer, Service};

/// Correlation header read from requests and written to responses.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request-scoped correlation identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(HeaderValue);

impl RequestId {
    /// String form; `None` if an inbound id is not visible ASCII.
    pub fn as_str(&self) -> Option<&str> {
        self.0.to_str().ok()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str().unwrap_or("<non-ascii>"))
    }
}

/// Access to the request id stored in request extensions.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&RequestId>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&RequestId> {
        self.extensions().get::<RequestId>()
    }
}

/// Generates ids from nanoseconds since the Unix epoch, never repeating.
#[derive(Debug, Default)]
pub struct RequestIdGenerator {
    last: AtomicU64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id: the current clock reading, bumped past the previous id if needed.
    pub fn next_id(&self) -> RequestId {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();

        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        let id = now.max(previous + 1);

        RequestId(HeaderValue::from(id))
    }
}

/// Layer that assigns or forwards the request id.
#[derive(Debug, Clone, Default)]
pub struct RequestIdLayer {
    generator: Arc<RequestIdGenerator>,
}

impl RequestIdLayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService {
            inner,
            generator: Arc::clone(&self.generator),
        }
    }
}

/// Service produced by [`RequestIdLayer`].
#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
    generator: Arc<RequestIdGenerator>,
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestIdService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    ResBody: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        // before: take the inbound id or mint one
        let request_id = match req.headers().get(X_REQUEST_ID) {
            Some(value) if !value.is_empty() => RequestId(value.clone()),
            _ => self.generator.next_id(),
        };
        req.extensions_mut().insert(request_id.clone());

        let future = self.inner.call(req);
        Box::pin(async move {
            // after: echo on the way out
            let mut response = future.await?;
            response
                .headers_mut()
                .insert(X_REQUEST_ID, request_id.0);
            Ok(response)
        })
    }
}
