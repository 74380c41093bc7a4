//! Response sink written by handlers and by the error funnel.
//!
//! # Responsibilities
//! - Collect status, status message and headers until the response is ended
//! - Deliver the finished response to the connection exactly once
//!
//! # Design Decisions
//! - `end` is terminal: later writes are ignored, a second `end` is a no-op
//! - A sink dropped without `end` still completes the response, with the
//!   status and headers written so far and an empty body, so a connection
//!   never waits on a request nobody will answer
//! - A custom status message is carried as hyper's `ReasonPhrase` extension,
//!   which the HTTP/1 encoder writes on the status line

use std::sync::{Mutex, MutexGuard, PoisonError};

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response as HttpResponse;
use hyper::ext::ReasonPhrase;
use tokio::sync::oneshot;

/// Receives the finished response for delivery to the client.
pub type ResponseReceiver = oneshot::Receiver<HttpResponse>;

#[derive(Debug)]
struct ResponseState {
    status: StatusCode,
    status_message: Option<String>,
    headers: HeaderMap,
    sender: Option<oneshot::Sender<HttpResponse>>,
}

impl ResponseState {
    fn finish(&mut self, body: Body) -> bool {
        let Some(sender) = self.sender.take() else {
            return false;
        };

        let mut response = HttpResponse::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = std::mem::take(&mut self.headers);

        if let Some(message) = self.status_message.take() {
            match ReasonPhrase::try_from(message) {
                Ok(reason) => {
                    response.extensions_mut().insert(reason);
                }
                Err(_) => tracing::warn!("Dropping status message with invalid characters"),
            }
        }

        // The connection may already be gone; there is nobody left to tell.
        let _ = sender.send(response);
        true
    }
}

/// The outgoing half of a request.
#[derive(Debug)]
pub struct Response {
    state: Mutex<ResponseState>,
}

impl Response {
    /// Create a sink together with the receiver the connection waits on.
    pub fn channel() -> (Self, ResponseReceiver) {
        let (tx, rx) = oneshot::channel();
        let response = Self {
            state: Mutex::new(ResponseState {
                status: StatusCode::OK,
                status_message: None,
                headers: HeaderMap::new(),
                sender: Some(tx),
            }),
        };
        (response, rx)
    }

    fn state(&self) -> MutexGuard<'_, ResponseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> StatusCode {
        self.state().status
    }

    pub fn set_status(&self, status: StatusCode) {
        let mut state = self.state();
        if state.sender.is_some() {
            state.status = status;
        }
    }

    /// Set the reason phrase sent on the status line.
    pub fn set_status_message(&self, message: impl Into<String>) {
        let mut state = self.state();
        if state.sender.is_some() {
            state.status_message = Some(message.into());
        }
    }

    pub fn set_header(&self, name: HeaderName, value: HeaderValue) {
        let mut state = self.state();
        if state.sender.is_some() {
            state.headers.insert(name, value);
        }
    }

    /// Whether the response has been handed to the connection.
    pub fn is_ended(&self) -> bool {
        self.state().sender.is_none()
    }

    /// Write `body` and complete the response.
    ///
    /// Returns `false` if the response had already been ended.
    pub fn end(&self, body: impl Into<Bytes>) -> bool {
        let ended = self.state().finish(Body::from(body.into()));
        if !ended {
            tracing::debug!("Response already ended, ignoring write");
        }
        ended
    }
}

impl Drop for Response {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if state.finish(Body::empty()) {
            tracing::debug!(status = %state.status, "Response dropped without end, sent empty body");
        }
    }
}
