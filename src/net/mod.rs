//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind; accept loop runs in axum::serve)
//!     → HTTP layer (http/server.rs)
//!     → inflight.rs (one guard per running dispatch)
//! ```
//!
//! # Design Decisions
//! - No accept backpressure: requests start handling as soon as they arrive
//! - Each dispatch tracked so shutdown can report what is still running

pub mod inflight;
pub mod listener;

pub use inflight::{DispatchId, InFlightGuard, InFlightTracker};
pub use listener::{bind, ListenerError};
