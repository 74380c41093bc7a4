//! Ambient access to the in-flight request's context.
//!
//! The binding is a tokio task-local scoped to one future: it follows that
//! future across `.await` points but is not inherited by `tokio::spawn`ed
//! tasks, which must carry the `Arc<Context>` themselves.

use std::future::Future;
use std::sync::Arc;

use super::Context;

tokio::task_local! {
    static CURRENT: Arc<Context>;
}

/// Run `future` with `ctx` as the current context.
///
/// Nested scopes shadow the outer context for their own extent.
pub async fn scope<F>(ctx: Arc<Context>, future: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(ctx, future).await
}

/// Synchronous counterpart of [`scope`].
pub fn sync_scope<R>(ctx: Arc<Context>, f: impl FnOnce() -> R) -> R {
    CURRENT.sync_scope(ctx, f)
}

/// The context bound by the innermost enclosing [`scope`], if any.
pub fn current() -> Option<Arc<Context>> {
    CURRENT.try_with(Arc::clone).ok()
}
