//! Access logging middleware.
//!
//! Emits one event per request once the inner stack is done with it: on a
//! response, on a handler panic unwinding through, or on the request future
//! being dropped at the shutdown deadline.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    http::{header::USER_AGENT, Method, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::request::{RequestId, RequestIdExt};
use crate::observability::metrics;

/// Fields captured before dispatch; logged on drop.
struct AccessLogEntry {
    request_id: Option<RequestId>,
    method: Method,
    path: String,
    remote_addr: Option<SocketAddr>,
    user_agent: String,
    status: Option<StatusCode>,
    start: Instant,
}

impl AccessLogEntry {
    fn from_request(req: &Request) -> Self {
        Self {
            request_id: req.request_id().cloned(),
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            remote_addr: req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
            user_agent: req
                .headers()
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string(),
            status: None,
            start: Instant::now(),
        }
    }
}

impl Drop for AccessLogEntry {
    fn drop(&mut self) {
        let request_id = self
            .request_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "unknown".to_string());
        let remote_addr = self
            .remote_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;

        match self.status {
            Some(status) => {
                tracing::info!(
                    request_id = %request_id,
                    method = %self.method,
                    path = %self.path,
                    remote_addr = %remote_addr,
                    user_agent = %self.user_agent,
                    status = status.as_u16(),
                    latency_ms,
                    "request completed"
                );
                metrics::record_request(self.method.as_str(), status.as_u16(), self.start);
            }
            None => {
                // Handler panicked or the request was cancelled mid-flight.
                tracing::warn!(
                    request_id = %request_id,
                    method = %self.method,
                    path = %self.path,
                    remote_addr = %remote_addr,
                    user_agent = %self.user_agent,
                    latency_ms,
                    "request completed without response"
                );
                metrics::record_request(self.method.as_str(), 0, self.start);
            }
        }
    }
}

/// Log every request exactly once, whatever the handler does.
pub async fn access_log(req: Request, next: Next) -> Response {
    let mut entry = AccessLogEntry::from_request(&req);
    let response = next.run(req).await;
    entry.status = Some(response.status());
    response
}
