//! Per-request context.
//!
//! # Data Flow
//! ```text
//! Accepted request
//!     → Context::new (request handle + response sink)
//!     → store::scope (ambient binding for the dispatch future)
//!     → dispatcher attaches params / error
//!     → handlers and the error funnel read and write through it
//!     → dropped once every holder has released it
//! ```
//!
//! # Design Decisions
//! - Shared as `Arc<Context>` so handlers may hand it to spawned work
//! - Interior mutability is limited to short, non-async critical sections
//! - Params are attached at most once, before any handler runs

pub mod store;

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use axum::body::Body;
use axum::http::Request as HttpRequest;

use crate::dispatch::error::HttpError;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseReceiver};
use crate::routing::Params;

pub use store::{current, scope};

/// Everything a handler can see about the request it is serving.
#[derive(Debug)]
pub struct Context {
    request: Request,
    response: Response,
    error: Mutex<Option<Arc<HttpError>>>,
    params: OnceLock<Params>,
}

impl Context {
    /// Build the context for an accepted request.
    ///
    /// The returned receiver resolves once the response is ended (or the
    /// context is dropped without ending it).
    pub fn new(request: HttpRequest<Body>, body_limit: usize) -> (Self, ResponseReceiver) {
        let (response, receiver) = Response::channel();
        let ctx = Self {
            request: Request::new(request, body_limit),
            response,
            error: Mutex::new(None),
            params: OnceLock::new(),
        };
        (ctx, receiver)
    }

    /// The context of the request currently being dispatched, if any.
    pub fn current() -> Option<Arc<Context>> {
        store::current()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Request ID, or `"unknown"` when the request-id layer did not run.
    pub fn request_id(&self) -> &str {
        self.request.request_id().unwrap_or("unknown")
    }

    /// The error being handled, set before `error` observers are invoked.
    pub fn error(&self) -> Option<Arc<HttpError>> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_error(&self, error: HttpError) -> Arc<HttpError> {
        let error = Arc::new(error);
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&error));
        error
    }

    /// Parameters captured from a dynamic route; `None` for literal routes.
    pub fn params(&self) -> Option<&Params> {
        self.params.get()
    }

    /// Shorthand for a single captured parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params().and_then(|params| params.get(name))
    }

    pub(crate) fn set_params(&self, params: Params) {
        if self.params.set(params).is_err() {
            tracing::warn!(request_id = %self.request_id(), "Route params already attached");
        }
    }
}
