//! HTTP server setup and connection lifecycle.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers and middleware
//! - Accept connections and serve HTTP/1.1 on each with hyper
//! - Apply read, write and idle timeouts per connection
//! - Drive the lifecycle: Serving → Draining → Stopped
//! - Drain in-flight requests on shutdown, bounded by a deadline

use axum::{
    extract::{ConnectInfo, FromRef},
    http::Request,
    middleware,
    routing::get,
    Router,
};
use hyper::{body::Incoming, server::conn::http1};
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tower::{ServiceBuilder, ServiceExt};
use tower_http::{catch_panic::CatchPanicLayer, services::ServeFile, timeout::TimeoutLayer};

use crate::config::{ServerConfig, TimeoutConfig};
use crate::health::{endpoint, CacheProbe};
use crate::http::middleware::access_log;
use crate::http::page::{self, PageState};
use crate::http::request::RequestIdLayer;
use crate::lifecycle::{Lifecycle, LifecycleState, Liveness, ShutdownSignal};
use crate::net::{ConnectionGuard, ConnectionPermit, ConnectionTracker, IdleTimeout, Listener, ListenerError};

/// Fatal server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("Could not install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    #[error("Could not gracefully shutdown the server: {0}")]
    Shutdown(#[source] JoinError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub page: PageState,
    pub liveness: Liveness,
}

impl FromRef<AppState> for PageState {
    fn from_ref(state: &AppState) -> Self {
        state.page.clone()
    }
}

impl FromRef<AppState> for Liveness {
    fn from_ref(state: &AppState) -> Self {
        state.liveness.clone()
    }
}

/// HTTP server for the greeting page.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    lifecycle: Lifecycle,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and cache probe.
    pub fn new(config: ServerConfig, probe: Arc<dyn CacheProbe>) -> Self {
        let lifecycle = Lifecycle::new();
        let state = AppState {
            page: PageState::new(config.assets.template_path(), probe),
            liveness: lifecycle.liveness(),
        };
        let router = Self::build_router(&config, state);

        Self {
            router,
            config,
            lifecycle,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run top to bottom on the request and bottom to top on the response.
    #[allow(deprecated)]
    pub fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let assets = &config.assets.dir;

        Router::new()
            .route("/", get(page::index))
            .route_service("/style.css", ServeFile::new(assets.join("style.css")))
            .route_service("/background.jpg", ServeFile::new(assets.join("background.jpg")))
            .merge(endpoint::routes())
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(RequestIdLayer::new())
                    .layer(middleware::from_fn(access_log))
                    .layer(TimeoutLayer::new(config.timeouts.write()))
                    .layer(CatchPanicLayer::new()),
            )
    }

    /// Read-only liveness handle, usable before and during `run`.
    pub fn liveness(&self) -> Liveness {
        self.lifecycle.liveness()
    }

    /// Subscribe to lifecycle transitions.
    pub fn lifecycle_events(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    /// Serve until `shutdown` fires, then drain.
    ///
    /// Returns `Ok` after a clean drain and also when the deadline forced the
    /// remaining connections closed. Returns `Err` only if the drain itself failed.
    pub async fn run(self, listener: Listener, mut shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let tracker = ConnectionTracker::new();
        let mut connections = JoinSet::new();

        self.lifecycle.serving();
        match listener.local_addr() {
            Ok(addr) => tracing::info!(
                address = %addr,
                max_connections = listener.max_connections(),
                "Server is ready to handle requests"
            ),
            Err(e) => tracing::warn!(error = %e, "Server is ready, local address unknown"),
        }

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        let connection = Connection {
                            stream,
                            peer,
                            permit,
                            guard: tracker.track(),
                        };
                        connections.spawn(self.serve_connection(connection, shutdown.clone()));
                    }
                    Err(ListenerError::Accept(e)) => {
                        // e.g. EMFILE: back off instead of spinning
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                    Err(e) => return Err(e.into()),
                },
            }

            while let Some(finished) = connections.try_join_next() {
                if let Err(e) = finished {
                    tracing::error!(error = %e, "Connection task failed");
                }
            }
        }

        self.lifecycle.draining();
        drop(listener);

        let deadline = self.config.timeouts.shutdown();
        tracing::info!(
            open_connections = tracker.active_count(),
            deadline = ?deadline,
            "Server is shutting down"
        );

        let result = match tokio::time::timeout(deadline, drain(&mut connections)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    open_connections = tracker.active_count(),
                    "Shutdown deadline elapsed, closing remaining connections"
                );
                connections.shutdown().await;
                Ok(())
            }
        };

        self.lifecycle.stopped();
        result
    }

    fn serve_connection(
        &self,
        connection: Connection,
        mut shutdown: ShutdownSignal,
    ) -> impl std::future::Future<Output = ()> + Send + 'static {
        let Connection {
            stream,
            peer,
            permit,
            guard,
        } = connection;
        let timeouts: &TimeoutConfig = &self.config.timeouts;

        let router = self.router.clone();
        let service = hyper::service::service_fn(move |mut request: Request<Incoming>| {
            request.extensions_mut().insert(ConnectInfo(peer));
            router.clone().oneshot(request)
        });

        let mut http = http1::Builder::new();
        http.timer(TokioTimer::new())
            .header_read_timeout(timeouts.read())
            .keep_alive(true);
        let io = TokioIo::new(IdleTimeout::new(stream, timeouts.idle()));
        let conn = http.serve_connection(io, service);

        async move {
            let _permit: ConnectionPermit = permit;
            let guard: ConnectionGuard = guard;
            tokio::pin!(conn);

            let result = tokio::select! {
                result = conn.as_mut() => result,
                _ = shutdown.wait() => {
                    // finish the in-flight request, then close instead of keeping alive
                    conn.as_mut().graceful_shutdown();
                    conn.await
                }
            };

            if let Err(e) = result {
                tracing::debug!(
                    connection_id = %guard.id(),
                    peer_addr = %peer,
                    error = %e,
                    "Connection closed with error"
                );
            }
        }
    }
}

/// An accepted connection and the bookkeeping that lives as long as it does.
struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    permit: ConnectionPermit,
    guard: ConnectionGuard,
}

/// Wait for every connection task; a task that panicked fails the drain.
async fn drain(connections: &mut JoinSet<()>) -> Result<(), ServerError> {
    while let Some(joined) = connections.join_next().await {
        if let Err(e) = joined {
            if e.is_panic() {
                return Err(ServerError::Shutdown(e));
            }
        }
    }
    Ok(())
}
