//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper HTTP/1.1, timeouts, graceful close)
//!     → request.rs (assign or forward X-Request-Id)
//!     → middleware/ (access log, handler timeout, panic catcher)
//!     → route dispatch
//!         /               → page.rs
//!         /healthz        → health::endpoint
//!         /style.css      → static file
//!         /background.jpg → static file
//! ```

pub mod middleware;
pub mod page;
pub mod request;
pub mod server;

pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError};
