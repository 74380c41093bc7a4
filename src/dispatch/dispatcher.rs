//! Per-request dispatch.
//!
//! # State Machine
//! ```text
//! Accepted → Routing → Handling → Responding → Done
//!                 │         │
//!                 └─────────┴──→ error funnel → Responding
//! ```
//!
//! # Design Decisions
//! - The whole dispatch runs inside the request's context scope
//! - One routing-table snapshot per request
//! - Exact key first, then dynamic match, then the not-found fallback, then a
//!   synthesized `NotFound` error
//! - Every observer for a key runs, in registration order, even after one
//!   fails; the first failure goes to the funnel once they have all finished
//! - `Err` returns and panics are both caught; nothing but an error-observer
//!   failure leaves `dispatch`

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;

use crate::context::{self, Context};
use crate::dispatch::error::{DispatchError, HandlerResult, HttpError};
use crate::dispatch::funnel;
use crate::dispatch::handler::BoxedHandler;
use crate::routing::key::normalize_method;
use crate::routing::{match_route, Event, Registry, RouteTable};

/// Resolves and runs the handlers for each request.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Dispatch one request. Returns only when every handler it started has finished.
    pub async fn dispatch(&self, ctx: Arc<Context>) -> Result<(), DispatchError> {
        let table = self.registry.snapshot();
        context::scope(Arc::clone(&ctx), run(table, ctx)).await
    }
}

async fn run(table: Arc<RouteTable>, ctx: Arc<Context>) -> Result<(), DispatchError> {
    let outcome = match resolve(&table, &ctx) {
        Some(handlers) => notify_all(handlers, &ctx).await,
        None => Err(HttpError::not_found()),
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(error) => funnel::handle_error(&table, &ctx, error).await,
    }
}

/// Find the handlers for this request, attaching params on a dynamic match.
fn resolve<'t>(table: &'t RouteTable, ctx: &Context) -> Option<&'t [BoxedHandler]> {
    let request = ctx.request();
    let method = normalize_method(request.method().as_str()).unwrap_or_else(|_| request.method().clone());
    let path = request.path();

    if let Some((key, handlers)) = table.lookup(&method, path) {
        tracing::debug!(route = %key, "Exact route matched");
        return Some(handlers);
    }

    if let Some(found) = match_route(table, &method, path) {
        tracing::debug!(route = %found.key, params = ?found.params, "Dynamic route matched");
        let handlers = table
            .lookup(found.method(), found.pattern().as_str())
            .map(|(_, handlers)| handlers);
        ctx.set_params(found.params);
        return handlers;
    }

    let fallback = table.handlers(&Event::NotFound);
    if !fallback.is_empty() {
        tracing::debug!(method = %method, path = %path, "No route matched, using fallback");
        return Some(fallback);
    }

    tracing::debug!(method = %method, path = %path, "No route matched");
    None
}

/// Run every handler, keeping the first failure.
pub(crate) async fn notify_all(handlers: &[BoxedHandler], ctx: &Arc<Context>) -> HandlerResult {
    let mut first_failure = None;
    for handler in handlers {
        if let Err(error) = invoke(Arc::clone(handler), Arc::clone(ctx)).await {
            if first_failure.is_some() {
                tracing::debug!(error = %error, "Additional handler failure discarded");
            } else {
                first_failure = Some(error);
            }
        }
    }
    first_failure.map_or(Ok(()), Err)
}

/// Run a handler, turning a panic anywhere in it into an error.
pub(crate) async fn invoke(handler: BoxedHandler, ctx: Arc<Context>) -> HandlerResult {
    let call = async move { handler.call(ctx).await };

    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            tracing::error!(panic = %panic_message(&*payload), "Handler panicked");
            Err(HttpError::panicked())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
