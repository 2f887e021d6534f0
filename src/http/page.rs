//! Landing page handler.
//!
//! Reads the template on every request, asks the cache probe whether Redis
//! answers, and swaps the `{{LEAD}}` token for the matching greeting.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::health::CacheProbe;

/// Token in the template replaced by the greeting.
pub const LEAD_PLACEHOLDER: &str = "{{LEAD}}";

/// Greeting shown when the cache answered the probe.
pub const CONNECTED_LEAD: &str =
    "This is a simple service application(connected to Redis). Deployed by Cloud 66 ~";

/// Greeting shown when the cache is unreachable.
pub const STANDALONE_LEAD: &str =
    "This is a simple single service application. Deployed by Cloud 66";

/// State needed to render the page.
#[derive(Clone)]
pub struct PageState {
    pub template_path: Arc<PathBuf>,
    pub probe: Arc<dyn CacheProbe>,
}

impl PageState {
    pub fn new(template_path: PathBuf, probe: Arc<dyn CacheProbe>) -> Self {
        Self {
            template_path: Arc::new(template_path),
            probe,
        }
    }
}

/// Greeting for a probe result.
pub fn lead(cache_reachable: bool) -> &'static str {
    if cache_reachable {
        CONNECTED_LEAD
    } else {
        STANDALONE_LEAD
    }
}

/// Substitute every placeholder occurrence.
pub fn render(template: &str, cache_reachable: bool) -> String {
    template.replace(LEAD_PLACEHOLDER, lead(cache_reachable))
}

/// `GET /`
pub async fn index(State(state): State<PageState>) -> Response {
    let template = match tokio::fs::read_to_string(state.template_path.as_ref()).await {
        Ok(template) => template,
        Err(e) => {
            tracing::error!(
                path = %state.template_path.display(),
                error = %e,
                "Failed to read page template"
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let reachable = state.probe.ping().await;
    Html(render(&template, reachable)).into_response()
}
