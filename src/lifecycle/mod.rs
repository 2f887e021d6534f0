//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Install signals → Bind listener → Serving
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Liveness down → Stop accepting → Drain → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - The liveness flag drops before the listener closes, so health checks
//!   fail fast while in-flight requests finish
//! - Shutdown has a deadline: remaining connections are dropped after it

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::{spawn_signal_watcher, Signals};
pub use state::{Lifecycle, LifecycleState, Liveness};
