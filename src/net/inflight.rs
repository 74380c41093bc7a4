//! In-flight dispatch tracking.
//!
//! # Responsibilities
//! - Generate unique dispatch IDs for tracing
//! - Count dispatches that are still running
//! - Let shutdown wait until every accepted request has finished
//!
//! # Design Decisions
//! - A guard per dispatch; dropping it (even on panic) releases the slot
//! - The count lives in a watch channel so waiters wake on change instead of polling

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::observability::metrics;

/// Global atomic counter for dispatch IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static DISPATCH_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchId(u64);

impl DispatchId {
    /// Generate a new unique dispatch ID.
    pub fn new() -> Self {
        Self(DISPATCH_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for DispatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DispatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dispatch-{}", self.0)
    }
}

/// Tracks running dispatches.
#[derive(Debug, Clone)]
pub struct InFlightTracker {
    count: Arc<watch::Sender<u64>>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { count: Arc::new(tx) }
    }

    /// Record a new dispatch. Returns a guard that releases it on drop.
    pub fn track(&self) -> InFlightGuard {
        self.count.send_modify(|count| *count += 1);
        metrics::set_in_flight(self.active_count());
        InFlightGuard {
            count: Arc::clone(&self.count),
            id: DispatchId::new(),
        }
    }

    /// Get current in-flight dispatch count.
    pub fn active_count(&self) -> u64 {
        *self.count.borrow()
    }

    /// Wait until no dispatch is running.
    pub async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

impl Default for InFlightTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that tracks a dispatch's lifetime.
#[derive(Debug)]
pub struct InFlightGuard {
    count: Arc<watch::Sender<u64>>,
    id: DispatchId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.count.send_modify(|count| *count = count.saturating_sub(1));
        metrics::set_in_flight(*self.count.borrow());
        tracing::trace!(dispatch_id = %self.id, "Dispatch finished");
    }
}
