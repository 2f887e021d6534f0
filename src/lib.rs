//! Greeting page server.
//!
//! Renders a static page whose lead line says whether a Redis instance is
//! reachable, exposes `/healthz`, and drains gracefully on SIGINT/SIGTERM.

pub mod cli;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServerConfig;
pub use health::{CacheProbe, RedisProbe};
pub use http::HttpServer;
pub use lifecycle::{Lifecycle, LifecycleState, Liveness, Shutdown};
