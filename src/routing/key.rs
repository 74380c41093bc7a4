//! Routing keys and path patterns.
//!
//! # Design Decisions
//! - A key is a typed `(Method, PathPattern)` pair; the `"<METHOD> <PATTERN>"`
//!   string form parses into it
//! - A segment starting with `:` captures the request segment under its name
//! - Patterns keep their raw text: literal routes are looked up by exact
//!   string equality against the request path
//! - Reserved events (`error`, not-found) are separate enum variants and can
//!   never collide with a route

use std::fmt;
use std::str::FromStr;

use axum::http::Method;
use thiserror::Error;

/// Marker that turns a pattern segment into a named capture.
pub const PARAM_MARKER: char = ':';

/// String form of the reserved not-found fallback event.
pub const NOT_FOUND_EVENT: &str = "__NOT_FOUND_ROUTE__";

/// String form of the reserved error event.
pub const ERROR_EVENT: &str = "error";

/// Errors produced while parsing a routing key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteKeyError {
    #[error("routing key `{0}` must be `<METHOD> <PATH>`")]
    MissingSeparator(String),

    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    #[error("path pattern `{0}` must start with `/`")]
    RelativePath(String),

    #[error("path pattern `{0}` has a parameter without a name")]
    UnnamedParam(String),
}

/// One `/`-delimited piece of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path pattern such as `/users/:id/posts`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, RouteKeyError> {
        if !raw.starts_with('/') {
            return Err(RouteKeyError::RelativePath(raw.to_string()));
        }

        let mut segments = Vec::new();
        for segment in split_segments(raw) {
            match segment.strip_prefix(PARAM_MARKER) {
                Some("") => return Err(RouteKeyError::UnnamedParam(raw.to_string())),
                Some(name) => segments.push(Segment::Param(name.to_string())),
                None => segments.push(Segment::Literal(segment.to_string())),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern exactly as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether any segment captures a parameter.
    pub fn is_dynamic(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Param(_)))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split a path on `/`, dropping empty segments.
pub fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Method plus path pattern identifying a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    method: Method,
    pattern: PathPattern,
}

impl RouteKey {
    pub fn new(method: Method, pattern: &str) -> Result<Self, RouteKeyError> {
        Ok(Self {
            method: normalize_method(method.as_str())?,
            pattern: PathPattern::parse(pattern)?,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.pattern)
    }
}

impl FromStr for RouteKey {
    type Err = RouteKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (method, pattern) = s
            .split_once(' ')
            .ok_or_else(|| RouteKeyError::MissingSeparator(s.to_string()))?;

        Ok(Self {
            method: normalize_method(method)?,
            pattern: PathPattern::parse(pattern)?,
        })
    }
}

/// Uppercase a method token and parse it.
pub fn normalize_method(method: &str) -> Result<Method, RouteKeyError> {
    if method.is_empty() {
        return Err(RouteKeyError::InvalidMethod(method.to_string()));
    }
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| RouteKeyError::InvalidMethod(method.to_string()))
}

/// Anything a handler can be registered for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    Route(RouteKey),
    /// Invoked when no route matches, before a not-found error is synthesized.
    NotFound,
    /// Invoked with the failing request's context instead of the default error response.
    Error,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Route(key) => key.fmt(f),
            Event::NotFound => f.write_str(NOT_FOUND_EVENT),
            Event::Error => f.write_str(ERROR_EVENT),
        }
    }
}

impl FromStr for Event {
    type Err = RouteKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            NOT_FOUND_EVENT => Ok(Event::NotFound),
            ERROR_EVENT => Ok(Event::Error),
            _ => s.parse().map(Event::Route),
        }
    }
}

impl From<RouteKey> for Event {
    fn from(key: RouteKey) -> Self {
        Event::Route(key)
    }
}
