//! HTTP server setup and the serving boundary.
//!
//! # Responsibilities
//! - Create the Axum router that sends every request to the dispatcher
//! - Wire up middleware (tracing, request ID, optional timeout)
//! - Run each dispatch on its own task and hand its response back to the connection
//! - Catch dispatch failures that escaped the error funnel
//! - Stop accepting on `close` while letting in-flight requests finish
//!
//! # Design Decisions
//! - No axum routes: the dispatcher owns routing, axum only owns the socket
//! - The dispatch task is detached from the connection, so a client that
//!   disconnects early does not cancel its handlers

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinHandle};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::config::ServerConfig;
use crate::context::Context;
use crate::dispatch::Dispatcher;
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::lifecycle::Shutdown;
use crate::net::{InFlightTracker, ListenerError};
use crate::observability::metrics;

/// Errors raised while starting or stopping a server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] std::io::Error),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] JoinError),
}

/// Application state injected into the fallback handler.
#[derive(Clone)]
struct AppState {
    dispatcher: Dispatcher,
    inflight: InFlightTracker,
    body_limit: usize,
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub(crate) fn build_router(
    config: &ServerConfig,
    dispatcher: Dispatcher,
    inflight: InFlightTracker,
) -> Router {
    let state = AppState {
        dispatcher,
        inflight,
        body_limit: config.limits.max_body_size,
    };

    let router = Router::new().fallback(serve_request).with_state(state);
    let router = match config.timeouts.request_secs {
        Some(secs) => router.layer(TimeoutLayer::new(Duration::from_secs(secs))),
        None => router,
    };

    router
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
}

/// Turn one accepted request into a dispatch and wait for its response.
async fn serve_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();

    let (ctx, finished) = Context::new(request, state.body_limit);
    let ctx = Arc::new(ctx);
    let span = tracing::info_span!(
        "dispatch",
        request_id = %ctx.request_id(),
        method = %ctx.request().method(),
        path = %ctx.request().path(),
    );

    let guard = state.inflight.track();
    let dispatcher = state.dispatcher.clone();
    tokio::spawn(
        async move {
            let _guard = guard;
            if let Err(e) = dispatcher.dispatch(Arc::clone(&ctx)).await {
                metrics::record_dispatch_failure();
                tracing::error!(error = %e, "Dispatch failed outside the error funnel");

                let response = ctx.response();
                if !response.is_ended() {
                    response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                    response.end(Bytes::new());
                }
            }
        }
        .instrument(span),
    );

    // The sender is consumed by `end` or by the response's drop, so this only
    // fails if the runtime tears the task down mid-dispatch.
    let response = match finished.await {
        Ok(response) => response,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

/// A running server.
///
/// Dropping it leaves the accept loop running in the background; call
/// [`Server::close`] to stop it.
#[derive(Debug)]
pub struct Server {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    inflight: InFlightTracker,
    task: JoinHandle<std::io::Result<()>>,
}

impl Server {
    pub(crate) fn start(
        listener: TcpListener,
        router: Router,
        inflight: InFlightTracker,
    ) -> Result<Self, ServerError> {
        let local_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();

        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(signal)
                .await
        });

        tracing::info!(address = %local_addr, "HTTP server listening");
        Ok(Self {
            local_addr,
            shutdown,
            inflight,
            task,
        })
    }

    /// Address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of dispatches still running.
    pub fn in_flight(&self) -> u64 {
        self.inflight.active_count()
    }

    /// Stop accepting connections, wait for open ones to finish, then wait
    /// for every dispatch still running.
    ///
    /// Requests already being handled are not aborted. A dispatch keeps
    /// running after its connection is gone (client disconnect, request
    /// timeout), so `close` only resolves once the last one has returned.
    pub async fn close(self) -> Result<(), ServerError> {
        tracing::info!(
            address = %self.local_addr,
            in_flight = self.inflight.active_count(),
            "HTTP server closing"
        );
        self.shutdown.trigger();

        self.task.await?.map_err(ServerError::Serve)?;

        let remaining = self.inflight.active_count();
        if remaining > 0 {
            tracing::info!(in_flight = remaining, "Waiting for running dispatches");
        }
        self.inflight.wait_idle().await;

        tracing::info!(address = %self.local_addr, "HTTP server stopped");
        Ok(())
    }
}
