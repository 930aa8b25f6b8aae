//! Authenticated builder presets.

use std::sync::Arc;

use serde_json::Value;

use super::context::resolve_auth_context;
use super::identity::IdentityProvider;
use crate::error::ProxyError;
use crate::pipeline::{
    identity_transformer, BackendContext, BackendHandler, BodyProvider, BuilderState, FetchMethod,
    HandlerBuilder, Payload, RequestDescription, ResponseTransformer,
};

/// Header the bearer extender writes.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Default builder with the bearer-auth extender already registered.
pub fn auth_handler(context: BackendContext, provider: Arc<dyn IdentityProvider>) -> HandlerBuilder {
    with_bearer_auth(&HandlerBuilder::new(context), provider)
}

/// Derive a builder that resolves the caller's auth context and sets
/// `Authorization: Bearer <access token>` on the outbound call.
///
/// Auth failures propagate unchanged, so the fetcher never runs for an
/// unauthenticated caller.
pub fn with_bearer_auth<S, B, R, T>(
    builder: &HandlerBuilder<S, B, R, T>,
    provider: Arc<dyn IdentityProvider>,
) -> HandlerBuilder<S, B, R, T>
where
    S: BuilderState,
    B: Payload,
    R: Send + 'static,
    T: Send + 'static,
{
    builder.extend_fetch_options(move |options: RequestDescription<B>| {
        let provider = Arc::clone(&provider);
        async move {
            let auth = resolve_auth_context(provider.as_ref(), &options.event).await?;
            Ok::<_, ProxyError>(
                options.with_header(AUTHORIZATION_HEADER, format!("Bearer {}", auth.access_token)),
            )
        }
    })
}

/// Everything needed to define an authenticated JSON handler in one call.
pub struct HandlerDefinition {
    pub path: String,
    pub method: FetchMethod,
    pub body_provider: Option<BodyProvider<Value>>,
    pub transformer: Option<ResponseTransformer<Value, Value>>,
}

impl HandlerDefinition {
    /// GET `path` with the body provider chosen by method.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: FetchMethod::Get,
            body_provider: None,
            transformer: None,
        }
    }

    pub fn method(mut self, method: FetchMethod) -> Self {
        self.method = method;
        self
    }

    pub fn body_provider(mut self, provider: BodyProvider<Value>) -> Self {
        self.body_provider = Some(provider);
        self
    }

    pub fn transformer(mut self, transformer: ResponseTransformer<Value, Value>) -> Self {
        self.transformer = Some(transformer);
        self
    }
}

/// Compile an authenticated handler from a [`HandlerDefinition`].
pub fn define_backend_handler(
    context: BackendContext,
    provider: Arc<dyn IdentityProvider>,
    definition: HandlerDefinition,
) -> BackendHandler<Value, Value, Value> {
    let transformer = definition.transformer.unwrap_or_else(identity_transformer);
    let builder = auth_handler(context, provider).with_method(definition.method);

    match definition.body_provider {
        Some(body) => builder
            .with_body_provider(body)
            .post_map(move |response: Value| transformer(response))
            .build(definition.path),
        None => builder
            .post_map(move |response: Value| transformer(response))
            .build(definition.path),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method, StatusCode, Uri};
    use serde_json::json;

    use super::*;
    use crate::auth::StaticIdentityProvider;
    use crate::config::RuntimeConfig;
    use crate::pipeline::{body_provider, fetcher, Fetcher, InboundEvent};

    fn context() -> BackendContext {
        BackendContext::new(RuntimeConfig::with_api_url("http://api.test"))
    }

    fn event() -> InboundEvent {
        InboundEvent::new(Method::GET, Uri::from_static("/"), HeaderMap::new(), Bytes::new())
    }

    fn counting_echo(calls: Arc<AtomicUsize>) -> Fetcher<Value, Value> {
        fetcher(move |options: RequestDescription<Value>| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(json!({ "headers": options.headers, "body": options.body })) }
        })
    }

    #[tokio::test]
    async fn sets_bearer_header() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = auth_handler(context(), Arc::new(StaticIdentityProvider::authenticated("abc")))
            .with_fetcher(counting_echo(Arc::clone(&calls)))
            .build("/users");

        let out = handler.handle(event()).await.unwrap();
        assert_eq!(out["headers"]["Authorization"], "Bearer abc");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_session_is_401_without_calling_backend() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = auth_handler(context(), Arc::new(StaticIdentityProvider::anonymous()))
            .with_fetcher(counting_echo(Arc::clone(&calls)))
            .build("/users");

        let err = handler.handle(event()).await.unwrap_err();
        assert_eq!(err.status_code, StatusCode::UNAUTHORIZED);
        assert_eq!(err.status_message, "Unauthorized");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn auth_survives_body_rebind() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = auth_handler(context(), Arc::new(StaticIdentityProvider::authenticated("abc")))
            .with_body_provider(body_provider(|_event| async { Ok(Some(json!({"fixed": true}))) }))
            .with_fetcher(counting_echo(Arc::clone(&calls)))
            .build("/users");

        let out = handler.handle(event()).await.unwrap();
        assert_eq!(out["headers"]["Authorization"], "Bearer abc");
        assert_eq!(out["body"], json!({"fixed": true}));
    }

    #[test]
    fn definition_defaults_to_get() {
        let definition = HandlerDefinition::new("/users");
        assert_eq!(definition.method, FetchMethod::Get);
        assert!(definition.body_provider.is_none());

        let handler = define_backend_handler(
            context(),
            Arc::new(StaticIdentityProvider::authenticated("abc")),
            definition.method(FetchMethod::Delete),
        );
        assert_eq!(handler.method(), FetchMethod::Delete);
        assert_eq!(handler.path(), "/users");
    }
}
