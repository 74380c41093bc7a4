//! Error funnel: the single place a request failure turns into a response.
//!
//! # Responsibilities
//! - Attach the error to the request context
//! - Delegate to registered `error` observers, or
//! - Resolve a default status and message and end the response
//!
//! # Design Decisions
//! - Observers own the response entirely; the funnel writes nothing once it
//!   has delegated
//! - Every observer runs even if an earlier one fails
//! - An observer failure is not retried and not re-funneled; the first one is
//!   returned to the serving boundary

use std::sync::Arc;

use crate::context::Context;
use crate::dispatch::dispatcher::notify_all;
use crate::dispatch::error::{DispatchError, HttpError};
use crate::routing::{Event, RouteTable};

/// Route `error` to the user's error observers or to the default response.
pub async fn handle_error(
    table: &RouteTable,
    ctx: &Arc<Context>,
    error: HttpError,
) -> Result<(), DispatchError> {
    let error = ctx.set_error(error);
    let observers = table.handlers(&Event::Error);

    if observers.is_empty() {
        respond_default(ctx, &error);
        return Ok(());
    }

    tracing::debug!(
        request_id = %ctx.request_id(),
        error = %error,
        observers = observers.len(),
        "Delegating error to error handlers"
    );

    notify_all(observers, ctx)
        .await
        .map_err(DispatchError::Delegate)
}

/// Default mapping: status from the error's hints, body from its message.
pub fn respond_default(ctx: &Context, error: &HttpError) {
    let status = error.resolved_status();
    let message = error.resolved_message();

    if status.is_server_error() {
        tracing::error!(request_id = %ctx.request_id(), status = %status, error = %error, "Request failed");
    } else {
        tracing::debug!(request_id = %ctx.request_id(), status = %status, error = %error, "Request rejected");
    }

    let response = ctx.response();
    response.set_status(status);
    response.end(message);
}
