//! Backend handler builder.
//!
//! # Responsibilities
//! - Hold the pipeline configuration for one route definition
//! - Derive new builders with one stage replaced or one transform appended
//! - Compile the configuration into a [`BackendHandler`]
//!
//! # States
//! ```text
//! Unbound   --with_body_provider-->  BodyBound
//! Unbound   --with_fetcher / post_map-->  Sealed
//! BodyBound --with_fetcher / post_map-->  Sealed
//! any state --with_method / extend_fetch_options-->  same state
//! ```
//!
//! # Design Decisions
//! - Derivations borrow the receiver and return a new builder; nothing mutates
//! - Once the body type is bound it cannot be rebound; once the fetcher or the
//!   transformer chain is customized neither the body nor the fetcher can be
//!   swapped, because the generic types downstream would no longer line up

use std::future::Future;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::body::{BodyProvider, BodySource};
use super::context::BackendContext;
use super::extender::{option_extender, ExtenderChain};
use super::fetcher::{default_fetcher, Fetcher};
use super::handler::BackendHandler;
use super::method::FetchMethod;
use super::request::RequestDescription;
use super::transformer::{compose, identity_transformer, ResponseTransformer};
use super::Payload;
use crate::error::ProxyResult;

/// Body provider and fetcher may both still be replaced.
#[derive(Debug, Clone, Copy)]
pub struct Unbound;

/// Body type fixed; the fetcher may still be replaced.
#[derive(Debug, Clone, Copy)]
pub struct BodyBound;

/// Neither the body provider nor the fetcher may be replaced.
#[derive(Debug, Clone, Copy)]
pub struct Sealed;

mod private {
    pub trait Sealed {}
    impl Sealed for super::Unbound {}
    impl Sealed for super::BodyBound {}
    impl Sealed for super::Sealed {}
}

/// Marker for builder states.
pub trait BuilderState: private::Sealed {}
impl BuilderState for Unbound {}
impl BuilderState for BodyBound {}
impl BuilderState for Sealed {}

/// States in which `with_fetcher` is available.
pub trait FetcherReplaceable: BuilderState {}
impl FetcherReplaceable for Unbound {}
impl FetcherReplaceable for BodyBound {}

/// Fully-populated stage configuration. Every field always has a value.
pub struct PipelineConfig<B, R, T> {
    pub(crate) fetcher: Fetcher<B, R>,
    pub(crate) body_provider: BodySource<B>,
    pub(crate) method: FetchMethod,
    pub(crate) option_extender: ExtenderChain<B>,
    pub(crate) response_transformer: ResponseTransformer<R, T>,
}

impl<B, R, T> Clone for PipelineConfig<B, R, T> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            body_provider: self.body_provider.clone(),
            method: self.method,
            option_extender: self.option_extender.clone(),
            response_transformer: self.response_transformer.clone(),
        }
    }
}

impl<B, R, T> PipelineConfig<B, R, T> {
    pub fn method(&self) -> FetchMethod {
        self.method
    }

    pub fn extender_count(&self) -> usize {
        self.option_extender.len()
    }
}

/// Immutable, chainable configuration of a backend handler.
///
/// `B` is the outbound body type, `R` the backend response type and `T` what
/// the caller finally receives.
pub struct HandlerBuilder<S = Unbound, B = Value, R = Value, T = R> {
    context: BackendContext,
    config: PipelineConfig<B, R, T>,
    _state: PhantomData<fn() -> S>,
}

impl<S, B, R, T> Clone for HandlerBuilder<S, B, R, T> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            config: self.config.clone(),
            _state: PhantomData,
        }
    }
}

impl HandlerBuilder {
    /// Builder over untyped JSON bodies and responses with all defaults:
    /// POST, body per method, default fetcher, no extenders, no transforms.
    pub fn new(context: BackendContext) -> Self {
        Self::typed(context)
    }
}

impl<B, R> HandlerBuilder<Unbound, B, R, R>
where
    B: Payload,
    R: DeserializeOwned + Send + 'static,
{
    /// Default builder for a specific body and response type.
    pub fn typed(context: BackendContext) -> Self {
        let fetcher = default_fetcher(context.client().clone());
        Self {
            context,
            config: PipelineConfig {
                fetcher,
                body_provider: BodySource::MethodDefault,
                method: FetchMethod::default(),
                option_extender: ExtenderChain::new(),
                response_transformer: identity_transformer(),
            },
            _state: PhantomData,
        }
    }

    /// Replace the body provider, possibly changing the body type.
    ///
    /// The fetcher is reset to the default fetcher for the new body type.
    /// Extenders already registered keep running, seeing the body as JSON.
    pub fn with_body_provider<B2>(&self, provider: BodyProvider<B2>) -> HandlerBuilder<BodyBound, B2, R, R>
    where
        B2: Payload,
    {
        HandlerBuilder {
            context: self.context.clone(),
            config: PipelineConfig {
                fetcher: default_fetcher(self.context.client().clone()),
                body_provider: BodySource::Custom(provider),
                method: self.config.method,
                option_extender: self.config.option_extender.rebind(),
                response_transformer: identity_transformer(),
            },
            _state: PhantomData,
        }
    }
}

impl<S, B, R> HandlerBuilder<S, B, R, R>
where
    S: FetcherReplaceable,
    B: Payload,
    R: Send + 'static,
{
    /// Replace the fetcher. The response type follows the new fetcher.
    pub fn with_fetcher<R2>(&self, fetcher: Fetcher<B, R2>) -> HandlerBuilder<Sealed, B, R2, R2>
    where
        R2: Send + 'static,
    {
        HandlerBuilder {
            context: self.context.clone(),
            config: PipelineConfig {
                fetcher,
                body_provider: self.config.body_provider.clone(),
                method: self.config.method,
                option_extender: self.config.option_extender.clone(),
                response_transformer: identity_transformer(),
            },
            _state: PhantomData,
        }
    }
}

impl<S, B, R, T> HandlerBuilder<S, B, R, T>
where
    S: BuilderState,
    B: Payload,
    R: Send + 'static,
    T: Send + 'static,
{
    pub fn method(&self) -> FetchMethod {
        self.config.method
    }

    pub fn context(&self) -> &BackendContext {
        &self.context
    }

    pub fn config(&self) -> &PipelineConfig<B, R, T> {
        &self.config
    }

    /// Replace the HTTP verb used for the outbound call and for default
    /// body-provider selection.
    pub fn with_method(&self, method: FetchMethod) -> Self {
        let mut config = self.config.clone();
        config.method = method;
        self.derive(config)
    }

    /// Append an extender; extenders run in registration order, each on the
    /// previous one's output.
    pub fn extend_fetch_options<F, Fut>(&self, extender: F) -> Self
    where
        F: Fn(RequestDescription<B>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ProxyResult<RequestDescription<B>>> + Send + 'static,
    {
        let mut config = self.config.clone();
        config.option_extender = config.option_extender.appended(option_extender(extender));
        self.derive(config)
    }

    /// Append a response transformer operating on the previous output.
    pub fn post_map<U, F, Fut>(&self, transformer: F) -> HandlerBuilder<Sealed, B, R, U>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ProxyResult<U>> + Send + 'static,
    {
        let config = PipelineConfig {
            fetcher: self.config.fetcher.clone(),
            body_provider: self.config.body_provider.clone(),
            method: self.config.method,
            option_extender: self.config.option_extender.clone(),
            response_transformer: compose(self.config.response_transformer.clone(), transformer),
        };
        self.derive(config)
    }

    /// Compile into a handler forwarding to `path` under the configured base URL.
    ///
    /// The builder stays usable; build it again for other paths.
    pub fn build(&self, path: impl Into<String>) -> BackendHandler<B, R, T> {
        BackendHandler::compile(path.into(), self.context.shared_runtime(), &self.config)
    }

    fn derive<S2, T2>(&self, config: PipelineConfig<B, R, T2>) -> HandlerBuilder<S2, B, R, T2> {
        HandlerBuilder {
            context: self.context.clone(),
            config,
            _state: PhantomData,
        }
    }
}

/// Start a builder with every stage at its default.
pub fn backend_handler_builder(context: BackendContext) -> HandlerBuilder {
    HandlerBuilder::new(context)
}

#[cfg(test)]
mod tests {
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method, Uri};
    use serde_json::json;

    use super::*;
    use crate::config::RuntimeConfig;
    use crate::error::ProxyError;
    use crate::pipeline::{fetcher, InboundEvent};

    fn context() -> BackendContext {
        BackendContext::new(RuntimeConfig::with_api_url("http://api.test"))
    }

    #[test]
    fn defaults_are_fully_populated() {
        let builder = HandlerBuilder::new(context());
        assert_eq!(builder.method(), FetchMethod::Post);
        assert_eq!(builder.config().extender_count(), 0);
        assert!(matches!(builder.config().body_provider, BodySource::MethodDefault));
    }

    #[test]
    fn derivations_leave_receiver_untouched() {
        let base = HandlerBuilder::new(context());
        let derived = base
            .with_method(FetchMethod::Delete)
            .extend_fetch_options(|options| async move { Ok(options) });

        assert_eq!(base.method(), FetchMethod::Post);
        assert_eq!(base.config().extender_count(), 0);
        assert_eq!(derived.method(), FetchMethod::Delete);
        assert_eq!(derived.config().extender_count(), 1);
    }

    #[test]
    fn body_rebind_keeps_method_and_extenders() {
        let builder = HandlerBuilder::new(context())
            .with_method(FetchMethod::Put)
            .extend_fetch_options(|options| async move { Ok(options) });
        let typed = builder.with_body_provider(crate::pipeline::no_body::<u32>());
        assert_eq!(typed.method(), FetchMethod::Put);
        assert_eq!(typed.config().extender_count(), 1);
    }

    fn echo() -> Fetcher<Value, Value> {
        fetcher(|options: RequestDescription<Value>| async move {
            Ok(json!({
                "url": options.url,
                "method": options.method.as_str(),
                "headers": options.headers,
                "body": options.body,
            }))
        })
    }

    #[tokio::test]
    async fn deriving_does_not_change_what_the_base_builds() {
        let event = InboundEvent::new(
            Method::POST,
            Uri::from_static("/u"),
            HeaderMap::new(),
            Bytes::from_static(br#"{"a":1}"#),
        );
        let base = HandlerBuilder::new(context()).with_fetcher(echo());
        let before = base.build("/u").handle(event.clone()).await.unwrap();

        let derived = base
            .with_method(FetchMethod::Get)
            .extend_fetch_options(|options| async move { Ok(options.with_header("X-Extra", "1")) })
            .post_map(|out: Value| async move { Ok::<_, ProxyError>(json!({ "wrapped": out })) });
        let after = base.build("/u").handle(event.clone()).await.unwrap();

        assert_eq!(before, after);
        assert_eq!(before["method"], "POST");
        assert_eq!(before["body"], json!({"a": 1}));

        let from_derived = derived.build("/u").handle(event).await.unwrap();
        assert_eq!(from_derived["wrapped"]["method"], "GET");
        assert_eq!(from_derived["wrapped"]["headers"]["X-Extra"], "1");
    }
}
