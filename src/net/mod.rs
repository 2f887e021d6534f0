//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → idle.rs (idle deadline on the raw stream)
//!     → connection.rs (id + open-connection count)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each connection tracked so the drain phase knows what it waits on

pub mod connection;
pub mod idle;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use idle::IdleTimeout;
pub use listener::{ConnectionPermit, Listener, ListenerError};
