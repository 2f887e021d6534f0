//! Health subsystem.
//!
//! # Data Flow
//! ```text
//! Liveness (endpoint.rs):
//!     GET /healthz → read lifecycle liveness flag → 204 | 503
//!
//! Dependency reachability (probe.rs):
//!     Page render → connect to cache → PING → bool
//! ```
//!
//! # Design Decisions
//! - Liveness is process state only; cache reachability never affects it
//! - Probe failures are absorbed, never surfaced as errors

pub mod endpoint;
pub mod probe;

pub use probe::{CacheProbe, RedisProbe};
