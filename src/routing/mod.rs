//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (setup time or while serving):
//!     "<METHOD> <PATTERN>" / Event
//!     → key.rs (parse into typed RouteKey)
//!     → registry.rs (append to a new RouteTable snapshot)
//!
//! Incoming request (method, path):
//!     → registry.rs (exact lookup on method + raw path)
//!     → matcher.rs (linear scan of dynamic patterns, extract params)
//!     → Return: matched RouteKey (+ Params) or NoMatch
//! ```
//!
//! # Design Decisions
//! - Typed keys; the string form is parsed once at registration
//! - Deterministic: same table and input always resolve to the same route
//! - First match wins (registration order)

pub mod key;
pub mod matcher;
pub mod registry;

pub use key::{Event, PathPattern, RouteKey, RouteKeyError, Segment};
pub use matcher::{match_route, Params, RouteMatch};
pub use registry::{Registry, RouteTable};
