//! Request handle exposed to handlers.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every incoming request
//! - Hold the request head (method, URI, version, headers) for the dispatch
//! - Hand out the body stream exactly once
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The raw path is kept undecoded; the query string is exposed separately
//!   and never takes part in routing

use std::sync::{Mutex, PoisonError};

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request as HttpRequest, Uri, Version};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID, both inbound and outbound.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates request IDs as random UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &HttpRequest<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The incoming half of a request as seen by handlers.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Mutex<Option<Body>>,
    body_limit: usize,
}

impl Request {
    pub(crate) fn new(request: HttpRequest<Body>, body_limit: usize) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body: Mutex::new(Some(body)),
            body_limit,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Raw, undecoded path without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string, if the request carried one.
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Request ID assigned by the request-id layer, if present.
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
    }

    /// Take the body stream. Returns `None` once it has been taken.
    pub fn take_body(&self) -> Option<Body> {
        self.body
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Maximum number of bytes [`crate::http::parse_body`] will buffer.
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }
}
