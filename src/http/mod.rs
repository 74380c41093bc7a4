//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (request head + one-shot body)
//!     → dispatcher (routing, handlers, error funnel)
//!     → response.rs (status, headers, body ended exactly once)
//!     → Send to client
//! ```

pub mod body;
pub mod request;
pub mod response;
pub mod server;

pub use body::parse_body;
pub use request::{MakeRequestUuid, Request, X_REQUEST_ID};
pub use response::{Response, ResponseReceiver};
pub use server::{Server, ServerError};
