//! HTTP middleware stack.
//!
//! - [`cors`]: cross-origin policy for browser clients.
//! - [`trace`]: per-request trace-ID and request/response logging.
//! - [`admission`]: token-bucket gate in front of the relay route.

pub mod admission;
pub mod cors;
pub mod trace;
