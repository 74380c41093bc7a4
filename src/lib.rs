//! Minimal async HTTP request dispatcher library

pub mod app;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use app::Application;
pub use config::schema::ServerConfig;
pub use context::Context;
pub use dispatch::{HandlerResult, HttpError};
pub use http::{parse_body, Server, ServerError};
pub use lifecycle::Shutdown;
pub use routing::{Event, RouteKey, RouteKeyError};
