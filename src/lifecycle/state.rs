//! Server lifecycle state and the liveness flag.
//!
//! # States
//! ```text
//! Starting → Serving → Draining → Stopped
//! ```
//!
//! The liveness flag is true only while `Serving`. It is owned by
//! [`Lifecycle`]; handlers only ever see the read-only [`Liveness`] handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// Phase of the server lifecycle. Ordered by progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Configured, listener not yet accepting.
    Starting,
    /// Accepting connections.
    Serving,
    /// Shutdown requested; finishing in-flight requests.
    Draining,
    /// All connections closed (or forcibly dropped).
    Stopped,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Serving => "serving",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Read-only view of the liveness flag.
#[derive(Debug, Clone)]
pub struct Liveness {
    live: Arc<AtomicBool>,
}

impl Liveness {
    /// Whether the server is between start-complete and shutdown-begin.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// Owner of the lifecycle state machine.
///
/// Transitions only move forward; a request to go backwards is ignored.
#[derive(Debug)]
pub struct Lifecycle {
    live: Arc<AtomicBool>,
    state: watch::Sender<LifecycleState>,
}

impl Lifecycle {
    /// Create a lifecycle in `Starting` with the flag down.
    pub fn new() -> Self {
        let (state, _) = watch::channel(LifecycleState::Starting);
        Self {
            live: Arc::new(AtomicBool::new(false)),
            state,
        }
    }

    /// Read-only liveness handle for the health endpoint.
    pub fn liveness(&self) -> Liveness {
        Liveness {
            live: Arc::clone(&self.live),
        }
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Listener is about to accept: raise the flag.
    pub fn serving(&self) {
        if self.advance(LifecycleState::Serving) {
            self.live.store(true, Ordering::SeqCst);
        }
    }

    /// Shutdown began: drop the flag before anything else happens.
    pub fn draining(&self) {
        self.live.store(false, Ordering::SeqCst);
        self.advance(LifecycleState::Draining);
    }

    /// Every connection is gone.
    pub fn stopped(&self) {
        self.live.store(false, Ordering::SeqCst);
        self.advance(LifecycleState::Stopped);
    }

    fn advance(&self, next: LifecycleState) -> bool {
        let mut from = None;
        self.state.send_if_modified(|current| {
            if next > *current {
                from = Some(*current);
                *current = next;
                true
            } else {
                false
            }
        });

        match from {
            Some(from) => {
                tracing::info!(from = %from, to = %next, "Lifecycle transition");
                true
            }
            None => false,
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
