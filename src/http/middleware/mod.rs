//! Request interceptors composed by the router.
//!
//! Order, outermost first:
//! 1. request id (`crate::http::request`): before = assign id, after = echo header
//! 2. access log: before = capture fields, after = emit one event (drop guard)
//! 3. handler timeout
//! 4. panic catcher

pub mod access_log;

pub use access_log::access_log;
