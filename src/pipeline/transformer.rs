//! Response transformer chain: async transforms over the backend response.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::error::ProxyResult;

/// Maps the backend response (`R`) to what the caller receives (`T`).
pub type ResponseTransformer<R, T> =
    Arc<dyn Fn(R) -> BoxFuture<'static, ProxyResult<T>> + Send + Sync>;

/// Pass the backend response through unchanged.
pub fn identity_transformer<R>() -> ResponseTransformer<R, R>
where
    R: Send + 'static,
{
    Arc::new(|response| futures_util::future::ready(Ok(response)).boxed())
}

/// Run `first`, then feed its output into `next`.
pub fn compose<R, T, U, F, Fut>(first: ResponseTransformer<R, T>, next: F) -> ResponseTransformer<R, U>
where
    R: Send + 'static,
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ProxyResult<U>> + Send + 'static,
{
    let next = Arc::new(next);
    Arc::new(move |response| {
        let first = Arc::clone(&first);
        let next = Arc::clone(&next);
        async move {
            let intermediate = first(response).await?;
            next(intermediate).await
        }
        .boxed()
    })
}
