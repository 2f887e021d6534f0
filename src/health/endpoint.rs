//! Liveness endpoint.
//!
//! - `/healthz`: `204 No Content` while serving, `503 Service Unavailable`
//!   before startup completes and from the moment shutdown begins
//!
//! Responses carry `Cache-Control: no-cache` and never a body.

use axum::{
    extract::{FromRef, State},
    http::{header, HeaderValue, StatusCode},
    routing::get,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::lifecycle::Liveness;

/// Router containing the liveness route.
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Liveness: FromRef<S>,
{
    Router::new()
        .route("/healthz", get(healthz))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
}

async fn healthz(State(liveness): State<Liveness>) -> StatusCode {
    if liveness.is_live() {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
