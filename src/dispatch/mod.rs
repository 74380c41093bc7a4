//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Context (from http/server.rs)
//!     → dispatcher.rs (context scope, route resolution, handler invocation)
//!     → handler.rs (user callbacks)
//!     → on any failure: funnel.rs (error observers or default response)
//! ```
//!
//! # Design Decisions
//! - Every failure from routing or handling is caught here
//! - The only error that leaves this module is a failing `error` observer
//! - Handlers share one signature; reserved events use the same type

pub mod dispatcher;
pub mod error;
pub mod funnel;
pub mod handler;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, HandlerResult, HttpError};
pub use handler::{BoxedHandler, Handler};
