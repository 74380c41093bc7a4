//! Route registration and lookup.
//!
//! # Responsibilities
//! - Store handlers per routing key, in registration order
//! - Answer exact `(method, path)` lookups
//! - Enumerate registered keys for the dynamic matcher
//! - Hold the reserved not-found and error observers
//!
//! # Design Decisions
//! - Observer semantics: many handlers per key, all invoked on dispatch
//! - Append-only: there is no unregister
//! - Readers take an immutable `Arc<RouteTable>` snapshot (lock-free via
//!   `ArcSwap`); registration publishes a new table, so it is safe while serving
//! - O(1) exact lookup via HashMap, O(n) dynamic scan in the matcher

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::Method;

use crate::dispatch::handler::BoxedHandler;
use crate::routing::key::{Event, RouteKey};

#[derive(Clone)]
struct RouteEntry {
    key: RouteKey,
    handlers: Vec<BoxedHandler>,
}

/// Immutable snapshot of every registration.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteEntry>,
    /// method → raw pattern → index into `routes`
    exact: HashMap<Method, HashMap<String, usize>>,
    not_found: Vec<BoxedHandler>,
    error: Vec<BoxedHandler>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `handler` as an observer of `event`.
    pub fn insert(&mut self, event: Event, handler: BoxedHandler) {
        match event {
            Event::NotFound => self.not_found.push(handler),
            Event::Error => self.error.push(handler),
            Event::Route(key) => {
                let by_path = self.exact.entry(key.method().clone()).or_default();
                let existing = by_path.get(key.pattern().as_str()).copied();
                match existing {
                    Some(index) => self.routes[index].handlers.push(handler),
                    None => {
                        by_path.insert(key.pattern().as_str().to_string(), self.routes.len());
                        self.routes.push(RouteEntry {
                            key,
                            handlers: vec![handler],
                        });
                    }
                }
            }
        }
    }

    /// Handlers registered for `event`, in registration order.
    pub fn handlers(&self, event: &Event) -> &[BoxedHandler] {
        match event {
            Event::NotFound => &self.not_found,
            Event::Error => &self.error,
            Event::Route(key) => self
                .lookup(key.method(), key.pattern().as_str())
                .map(|(_, handlers)| handlers)
                .unwrap_or(&[]),
        }
    }

    pub fn has_handler(&self, event: &Event) -> bool {
        !self.handlers(event).is_empty()
    }

    /// Exact lookup of a request path against registered patterns.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<(&RouteKey, &[BoxedHandler])> {
        let index = *self.exact.get(method)?.get(path)?;
        let entry = &self.routes[index];
        Some((&entry.key, entry.handlers.as_slice()))
    }

    /// Registered routing keys in insertion order. Reserved events are never included.
    pub fn keys(&self) -> impl Iterator<Item = &RouteKey> {
        self.routes.iter().map(|entry| &entry.key)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.keys().map(ToString::to_string).collect::<Vec<_>>())
            .field("not_found", &self.not_found.len())
            .field("error", &self.error.len())
            .finish()
    }
}

/// Shared registration surface.
#[derive(Debug)]
pub struct Registry {
    table: ArcSwap<RouteTable>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(RouteTable::new()),
        }
    }

    pub fn register(&self, event: Event, handler: BoxedHandler) {
        tracing::debug!(event = %event, "Registering handler");
        self.table.rcu(|current| {
            let mut next = RouteTable::clone(current);
            next.insert(event.clone(), Arc::clone(&handler));
            next
        });
    }

    pub fn has_handler(&self, event: &Event) -> bool {
        self.table.load().has_handler(event)
    }

    /// Registered routing keys in insertion order.
    pub fn list_keys(&self) -> Vec<RouteKey> {
        self.table.load().keys().cloned().collect()
    }

    /// Current routing table. A dispatch holds one snapshot for its whole duration.
    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::dispatch::error::HandlerResult;

    fn noop() -> BoxedHandler {
        Arc::new(|_ctx: Arc<Context>| async { HandlerResult::Ok(()) })
    }

    fn route(key: &str) -> Event {
        Event::Route(key.parse().unwrap())
    }

    #[test]
    fn multiple_observers_share_a_key() {
        let registry = Registry::new();
        registry.register(route("GET /"), noop());
        registry.register(route("GET /"), noop());

        let table = registry.snapshot();
        assert_eq!(table.len(), 1);
        assert_eq!(table.handlers(&route("GET /")).len(), 2);
    }

    #[test]
    fn keys_keep_insertion_order_and_skip_reserved() {
        let registry = Registry::new();
        registry.register(route("GET /b"), noop());
        registry.register(Event::Error, noop());
        registry.register(route("POST /a/:id"), noop());
        registry.register(Event::NotFound, noop());
        registry.register(route("GET /a"), noop());

        let keys: Vec<String> = registry.list_keys().iter().map(ToString::to_string).collect();
        assert_eq!(keys, ["GET /b", "POST /a/:id", "GET /a"]);
        assert!(registry.has_handler(&Event::Error));
        assert!(registry.has_handler(&Event::NotFound));
    }

    #[test]
    fn exact_lookup_is_by_method_and_raw_path() {
        let registry = Registry::new();
        registry.register(route("GET /users"), noop());

        let table = registry.snapshot();
        assert!(table.lookup(&Method::GET, "/users").is_some());
        assert!(table.lookup(&Method::GET, "/users/").is_none());
        assert!(table.lookup(&Method::POST, "/users").is_none());
        assert!(!table.has_handler(&route("PUT /users")));
    }

    #[test]
    fn snapshots_are_unaffected_by_later_registration() {
        let registry = Registry::new();
        let before = registry.snapshot();
        registry.register(route("GET /late"), noop());

        assert!(before.is_empty());
        assert_eq!(registry.snapshot().len(), 1);
    }
}
