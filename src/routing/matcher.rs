//! Dynamic route matching.
//!
//! # Responsibilities
//! - Match a request path against registered patterns containing `:param` segments
//! - Extract parameter values keyed by name
//!
//! # Design Decisions
//! - Only the dynamic subset is scanned; literal routes are resolved by the
//!   exact lookup before the matcher runs
//! - Segment counts must be equal: no prefix matching, no catch-all segments
//! - Literal segments compare byte-for-byte (case-sensitive, no decoding)
//! - First match in registration order wins
//! - No regex, no trie: O(routes × segments)

use axum::http::Method;

use crate::routing::key::{split_segments, PathPattern, RouteKey, Segment};
use crate::routing::registry::RouteTable;

/// Parameter values captured from a dynamic route, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Insert a value; a repeated name overwrites the earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Successful dynamic match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub key: RouteKey,
    pub params: Params,
}

impl RouteMatch {
    pub fn method(&self) -> &Method {
        self.key.method()
    }

    pub fn pattern(&self) -> &PathPattern {
        self.key.pattern()
    }
}

/// Match one pattern against pre-split request segments.
fn match_pattern(pattern: &PathPattern, request: &[&str]) -> Option<Params> {
    if pattern.len() != request.len() {
        return None;
    }

    let mut params = Params::default();
    for (segment, actual) in pattern.segments().iter().zip(request) {
        match segment {
            Segment::Literal(expected) if expected != actual => return None,
            Segment::Literal(_) => {}
            Segment::Param(name) => params.insert(name.as_str(), *actual),
        }
    }
    Some(params)
}

/// Find the first dynamic route of `method` whose pattern matches `path`.
pub fn match_route(table: &RouteTable, method: &Method, path: &str) -> Option<RouteMatch> {
    let request: Vec<&str> = split_segments(path).collect();

    table
        .keys()
        .filter(|key| key.method() == method && key.pattern().is_dynamic())
        .find_map(|key| {
            match_pattern(key.pattern(), &request).map(|params| RouteMatch {
                key: key.clone(),
                params,
            })
        })
}
