//! Errors surfaced by handlers and by the dispatcher itself.
//!
//! # Design Decisions
//! - `HttpError` is the single error value that reaches the error funnel
//! - It carries two optional status hints (`status_code`, then `status`);
//!   the funnel resolves them in that order and defaults to 500
//! - Any `std::error::Error` converts into it, so handlers can use `?`
//! - `HttpError` deliberately does not implement `std::error::Error` itself,
//!   otherwise the blanket `From` impl would overlap with `From<T> for T`

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use axum::http::StatusCode;
use thiserror::Error;

/// Name carried by the synthesized "no route matched" error.
pub const NOT_FOUND_NAME: &str = "NotFound";

/// Name carried by errors recovered from a panicking handler.
pub const PANIC_NAME: &str = "Panic";

const DEFAULT_NAME: &str = "Error";

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type returned by request handlers.
pub type HandlerResult = Result<(), HttpError>;

/// A failure raised while handling a request.
#[derive(Debug)]
pub struct HttpError {
    name: Cow<'static, str>,
    message: String,
    status_code: Option<u16>,
    status: Option<u16>,
    source: Option<BoxError>,
}

impl HttpError {
    /// Create an error with the given message and no status hints.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: Cow::Borrowed(DEFAULT_NAME),
            message: message.into(),
            status_code: None,
            status: None,
            source: None,
        }
    }

    /// An error with neither a message nor a status.
    pub fn empty() -> Self {
        Self::new(String::new())
    }

    /// The error the dispatcher synthesizes when nothing handles a request.
    pub fn not_found() -> Self {
        Self::new("Not Found")
            .with_name(NOT_FOUND_NAME)
            .with_status(404)
            .with_status_code(404)
    }

    pub(crate) fn panicked() -> Self {
        Self::empty().with_name(PANIC_NAME)
    }

    /// Wrap an underlying error, keeping it reachable through [`HttpError::source`].
    pub fn from_source<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let mut error = Self::new(source.to_string());
        error.source = Some(Box::new(source));
        error
    }

    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the primary status hint.
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Set the secondary status hint, used when no status code is present.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn source(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    pub fn is_not_found(&self) -> bool {
        self.name == NOT_FOUND_NAME
    }

    /// Status the default error path responds with.
    ///
    /// `status_code` wins over `status`; a zero hint counts as missing, and a
    /// missing or out-of-range hint resolves to 500.
    pub fn resolved_status(&self) -> StatusCode {
        let present = |code: &u16| *code != 0;
        self.status_code
            .filter(present)
            .or(self.status.filter(present))
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Body the default error path responds with: the message, or the
    /// canonical reason phrase when the message is empty.
    pub fn resolved_message(&self) -> String {
        if self.message.is_empty() {
            self.resolved_status()
                .canonical_reason()
                .unwrap_or_default()
                .to_string()
        } else {
            self.message.clone()
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

impl<E> From<E> for HttpError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(source: E) -> Self {
        Self::from_source(source)
    }
}

/// Failures that escape the dispatcher to the serving boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A registered `error` observer failed while handling another error.
    #[error("error handler failed: {0}")]
    Delegate(HttpError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_status_code_falls_through_to_status() {
        let err = HttpError::new("x").with_status_code(0).with_status(404);
        assert_eq!(err.resolved_status(), StatusCode::NOT_FOUND);

        let err = HttpError::new("x").with_status_code(0).with_status(0);
        assert_eq!(err.resolved_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn status_code_takes_precedence_over_status() {
        let err = HttpError::new("teapot").with_status(400).with_status_code(418);
        assert_eq!(err.resolved_status(), StatusCode::IM_A_TEAPOT);

        let err = HttpError::new("bad").with_status(400);
        assert_eq!(err.resolved_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_or_invalid_status_defaults_to_500() {
        assert_eq!(HttpError::empty().resolved_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            HttpError::new("x").with_status(42).resolved_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn empty_message_falls_back_to_reason_phrase() {
        assert_eq!(HttpError::empty().resolved_message(), "Internal Server Error");
        assert_eq!(HttpError::empty().with_status(403).resolved_message(), "Forbidden");
        assert_eq!(HttpError::new("boom").resolved_message(), "boom");
    }

    #[test]
    fn not_found_is_tagged() {
        let err = HttpError::not_found();
        assert!(err.is_not_found());
        assert_eq!(err.name(), "NotFound");
        assert_eq!(err.resolved_status(), StatusCode::NOT_FOUND);
        assert_eq!(err.resolved_message(), "Not Found");
    }

    #[test]
    fn std_errors_convert_with_source() {
        fn fails() -> Result<(), HttpError> {
            let _: u32 = "nope".parse()?;
            Ok(())
        }

        let err = fails().unwrap_err();
        assert_eq!(err.message(), "invalid digit found in string");
        assert!(err.source().is_some());
        assert_eq!(err.resolved_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
