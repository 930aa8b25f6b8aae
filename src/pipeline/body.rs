//! Body providers: how a handler extracts the inbound body.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;

use super::event::InboundEvent;
use super::method::FetchMethod;
use crate::error::ProxyResult;

/// Extracts the body for the outbound call. `None` means "send no body".
pub type BodyProvider<B> =
    Arc<dyn Fn(InboundEvent) -> BoxFuture<'static, ProxyResult<Option<B>>> + Send + Sync>;

/// Wrap an async closure as a [`BodyProvider`].
pub fn body_provider<B, F, Fut>(f: F) -> BodyProvider<B>
where
    F: Fn(InboundEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ProxyResult<Option<B>>> + Send + 'static,
{
    Arc::new(move |event| f(event).boxed())
}

/// Parse the full inbound body as JSON.
pub fn extract_event_body<B>() -> BodyProvider<B>
where
    B: DeserializeOwned + Send + 'static,
{
    body_provider(|event: InboundEvent| async move { event.read_body::<B>() })
}

/// Ignore the inbound body entirely.
pub fn no_body<B>() -> BodyProvider<B>
where
    B: Send + 'static,
{
    body_provider(|_event: InboundEvent| async { Ok(None) })
}

/// Full body for POST/PUT, none for GET/DELETE.
pub fn default_body_provider<B>(method: FetchMethod) -> BodyProvider<B>
where
    B: DeserializeOwned + Send + 'static,
{
    if method.expects_body() {
        extract_event_body()
    } else {
        no_body()
    }
}

/// Body stage as configured on a builder.
///
/// The default is resolved against the method in effect when the handler is
/// built, so `with_method` after construction still picks the right provider.
pub(crate) enum BodySource<B> {
    MethodDefault,
    Custom(BodyProvider<B>),
}

impl<B> BodySource<B>
where
    B: DeserializeOwned + Send + 'static,
{
    pub(crate) fn resolve(&self, method: FetchMethod) -> BodyProvider<B> {
        match self {
            BodySource::MethodDefault => default_body_provider(method),
            BodySource::Custom(provider) => Arc::clone(provider),
        }
    }
}

impl<B> Clone for BodySource<B> {
    fn clone(&self) -> Self {
        match self {
            BodySource::MethodDefault => BodySource::MethodDefault,
            BodySource::Custom(provider) => BodySource::Custom(Arc::clone(provider)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method, Uri};
    use serde_json::{json, Value};

    fn post_event() -> InboundEvent {
        InboundEvent::new(
            Method::POST,
            Uri::from_static("/users"),
            HeaderMap::new(),
            Bytes::from_static(br#"{"id":7}"#),
        )
    }

    #[tokio::test]
    async fn default_provider_reads_body_for_post_and_put() {
        for method in [FetchMethod::Post, FetchMethod::Put] {
            let provider = default_body_provider::<Value>(method);
            let body = provider(post_event()).await.unwrap();
            assert_eq!(body, Some(json!({"id": 7})), "{method}");
        }
    }

    #[tokio::test]
    async fn default_provider_ignores_body_for_get_and_delete() {
        for method in [FetchMethod::Get, FetchMethod::Delete] {
            let provider = default_body_provider::<Value>(method);
            let body = provider(post_event()).await.unwrap();
            assert!(body.is_none(), "{method}");
        }
    }

    #[tokio::test]
    async fn method_default_source_follows_method() {
        let source = BodySource::<Value>::MethodDefault;
        assert!(source.resolve(FetchMethod::Get)(post_event()).await.unwrap().is_none());
        assert!(source.resolve(FetchMethod::Post)(post_event()).await.unwrap().is_some());
    }
}
