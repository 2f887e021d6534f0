//! Startup orchestration.
//!
//! Order: signal handlers → listener → probe → server. Any failure before
//! the server starts serving is fatal and returned to the caller.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::health::RedisProbe;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::{spawn_signal_watcher, Shutdown, Signals};
use crate::net::Listener;

/// Run the server until a termination signal arrives and the drain finishes.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    // Before binding: a process that cannot hear SIGTERM must not take traffic.
    let signals = Signals::install().map_err(ServerError::Signals)?;

    tracing::info!(address = %config.listener.bind_address, "Server is starting");
    let listener = Listener::bind(&config.listener).await?;

    let probe = RedisProbe::from_config(&config.cache);
    tracing::info!(url = %probe.url(), "Checking Redis");

    let shutdown = Shutdown::new();
    let watcher = spawn_signal_watcher(signals, shutdown.clone());

    let server = HttpServer::new(config, Arc::new(probe));
    let result = server.run(listener, shutdown.subscribe()).await;

    watcher.abort();
    result
}
