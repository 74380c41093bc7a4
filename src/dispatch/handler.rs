//! Handler abstraction shared by routes, the not-found fallback and error observers.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::dispatch::error::HandlerResult;

/// A callback invoked with the request's context.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: Arc<Context>) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: Arc<Context>) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(ctx))
    }
}

/// Type-erased handler as stored in the route table.
pub type BoxedHandler = Arc<dyn Handler>;
