//! Application facade: handler registration and listening.
//!
//! # Responsibilities
//! - Parse string keys (`"GET /users/:id"`, `"error"`, `"__NOT_FOUND_ROUTE__"`)
//!   into typed events and register handlers under them
//! - Answer whether an event has listeners
//! - Bind a listener and start serving the registered routes
//!
//! # Design Decisions
//! - Registration takes `&self` and may continue after `listen`; running
//!   dispatches keep the table snapshot they started with
//! - Registration methods return `&Self` so calls chain

use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use axum::Router;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::context::Context;
use crate::dispatch::{BoxedHandler, Dispatcher, HandlerResult};
use crate::http::server::{self, Server, ServerError};
use crate::net::{self, InFlightTracker};
use crate::routing::key::{ERROR_EVENT, NOT_FOUND_EVENT};
use crate::routing::{Event, Registry, RouteKey, RouteKeyError};

/// An HTTP application: a set of handlers plus the configuration to serve them.
#[derive(Debug, Clone)]
pub struct Application {
    registry: Arc<Registry>,
    config: ServerConfig,
}

impl Application {
    /// Event name of the fallback handler run when no route matches.
    pub const NOT_FOUND_ROUTE: &'static str = NOT_FOUND_EVENT;

    /// Event name of the error observers.
    pub const ERROR: &'static str = ERROR_EVENT;

    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Register `handler` under a string event name.
    ///
    /// `event` is either a routing key such as `"POST /users/:id"` or one of
    /// the reserved names [`Self::NOT_FOUND_ROUTE`] and [`Self::ERROR`].
    /// Several handlers may share an event; they run in registration order.
    pub fn on<F, Fut>(&self, event: &str, handler: F) -> Result<&Self, RouteKeyError>
    where
        F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let event: Event = event.parse()?;
        Ok(self.register(event, Arc::new(handler)))
    }

    /// Register `handler` for `method` requests whose path matches `pattern`.
    pub fn route<F, Fut>(
        &self,
        method: Method,
        pattern: &str,
        handler: F,
    ) -> Result<&Self, RouteKeyError>
    where
        F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let key = RouteKey::new(method, pattern)?;
        Ok(self.register(Event::Route(key), Arc::new(handler)))
    }

    /// Register the fallback run when no route matches.
    pub fn on_not_found<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Event::NotFound, Arc::new(handler))
    }

    /// Register an error observer. Observers take over the response of any
    /// request that fails.
    pub fn on_error<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register(Event::Error, Arc::new(handler))
    }

    /// Register an already type-erased handler.
    pub fn register(&self, event: Event, handler: BoxedHandler) -> &Self {
        self.registry.register(event, handler);
        self
    }

    /// Whether any handler is registered under `event`. Malformed keys have none.
    pub fn has_listeners(&self, event: &str) -> bool {
        event
            .parse::<Event>()
            .is_ok_and(|event| self.registry.has_handler(&event))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The axum router serving this application, for embedding in another server.
    pub fn router(&self) -> Router {
        self.build_router(InFlightTracker::new())
    }

    /// Bind the configured address and start serving.
    pub async fn listen(&self) -> Result<Server, ServerError> {
        let listener = net::bind(&self.config.listener).await?;
        self.listen_on(listener).await
    }

    /// Start serving on an already bound listener.
    pub async fn listen_on(&self, listener: TcpListener) -> Result<Server, ServerError> {
        let inflight = InFlightTracker::new();
        let router = self.build_router(inflight.clone());
        tracing::debug!(routes = self.registry.list_keys().len(), "Starting server");
        Server::start(listener, router, inflight)
    }

    fn build_router(&self, inflight: InFlightTracker) -> Router {
        let dispatcher = Dispatcher::new(Arc::clone(&self.registry));
        server::build_router(&self.config, dispatcher, inflight)
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}
