//! Compiled backend handlers.
//!
//! # Responsibilities
//! - Run one pipeline invocation per inbound request
//! - Normalize every failure at the boundary
//! - Adapt the pipeline to an axum route
//!
//! # Data Flow
//! ```text
//! InboundEvent
//!     → api_url check (Configuration error when absent)
//!     → body provider
//!     → RequestDescription { url: api_url + path, method, body, Content-Type }
//!     → extender chain (registration order)
//!     → fetcher
//!     → response transformers
//!     → T | NormalizedError
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
    routing::{on, MethodRouter},
    Json,
};
use serde::Serialize;

use super::body::BodyProvider;
use super::builder::PipelineConfig;
use super::event::{InboundEvent, DEFAULT_BODY_LIMIT};
use super::extender::ExtenderChain;
use super::fetcher::Fetcher;
use super::method::FetchMethod;
use super::request::RequestDescription;
use super::transformer::ResponseTransformer;
use super::Payload;
use crate::config::RuntimeConfig;
use crate::error::{normalize, NormalizedError, ProxyError, ProxyResult};
use crate::observability::metrics;

pub const MISSING_API_URL: &str =
    "API URL is not configured in runtime config. Set the env variable API_URL.";

/// A request handler compiled from a builder for one backend path.
///
/// Cheap to clone; every clone shares the same compiled stages.
pub struct BackendHandler<B, R, T> {
    inner: Arc<CompiledHandler<B, R, T>>,
}

struct CompiledHandler<B, R, T> {
    path: String,
    method: FetchMethod,
    body_limit: usize,
    runtime: Arc<RuntimeConfig>,
    body_provider: BodyProvider<B>,
    extenders: ExtenderChain<B>,
    fetcher: Fetcher<B, R>,
    transformer: ResponseTransformer<R, T>,
}

impl<B, R, T> Clone for BackendHandler<B, R, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B, R, T> fmt::Debug for BackendHandler<B, R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendHandler")
            .field("path", &self.inner.path)
            .field("method", &self.inner.method)
            .field("extenders", &self.inner.extenders.len())
            .finish()
    }
}

impl<B, R, T> BackendHandler<B, R, T>
where
    B: Payload,
    R: Send + 'static,
    T: Send + 'static,
{
    pub(crate) fn compile(
        path: String,
        runtime: Arc<RuntimeConfig>,
        config: &PipelineConfig<B, R, T>,
    ) -> Self {
        Self {
            inner: Arc::new(CompiledHandler {
                path,
                method: config.method,
                body_limit: DEFAULT_BODY_LIMIT,
                runtime,
                body_provider: config.body_provider.resolve(config.method),
                extenders: config.option_extender.clone(),
                fetcher: Arc::clone(&config.fetcher),
                transformer: Arc::clone(&config.response_transformer),
            }),
        }
    }

    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn method(&self) -> FetchMethod {
        self.inner.method
    }

    /// Same handler with a different inbound body limit for [`serve`](Self::serve).
    pub fn with_body_limit(&self, limit: usize) -> Self {
        let inner = &self.inner;
        Self {
            inner: Arc::new(CompiledHandler {
                path: inner.path.clone(),
                method: inner.method,
                body_limit: limit,
                runtime: Arc::clone(&inner.runtime),
                body_provider: Arc::clone(&inner.body_provider),
                extenders: inner.extenders.clone(),
                fetcher: Arc::clone(&inner.fetcher),
                transformer: Arc::clone(&inner.transformer),
            }),
        }
    }

    /// Run the pipeline for one inbound request.
    ///
    /// Never retries. Any stage failure is normalized before it is returned.
    pub async fn handle(&self, event: InboundEvent) -> Result<T, NormalizedError> {
        let start = Instant::now();
        let request_id = event.request_id().to_string();

        let result = self.run(event).await.map_err(normalize);

        let status = match &result {
            Ok(_) => {
                tracing::debug!(
                    request_id = %request_id,
                    path = %self.inner.path,
                    method = %self.inner.method,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Backend call completed"
                );
                200
            }
            Err(err) => {
                log_failure(&request_id, &self.inner.path, err);
                err.status_code.as_u16()
            }
        };

        metrics::record_request(&self.inner.path, self.inner.method.as_str(), status, start);
        result
    }

    async fn run(&self, event: InboundEvent) -> ProxyResult<T> {
        let inner = &self.inner;

        let api_url = inner
            .runtime
            .api_url()
            .ok_or_else(|| ProxyError::Configuration(MISSING_API_URL.to_string()))?;

        let body = (inner.body_provider)(event.clone()).await?;
        let options = RequestDescription::new(
            format!("{api_url}{}", inner.path),
            inner.method,
            body,
            event,
        );
        let options = inner.extenders.apply(options).await?;
        let response = (inner.fetcher)(options).await?;

        (inner.transformer)(response).await
    }
}

impl<B, R, T> BackendHandler<B, R, T>
where
    B: Payload,
    R: Send + 'static,
    T: Serialize + Send + 'static,
{
    /// Serve one axum request: buffer it, run the pipeline, write JSON back.
    ///
    /// If the client goes away while the pipeline runs, this future is
    /// dropped and the event's cancellation token fires, aborting the
    /// in-flight backend call.
    pub async fn serve(&self, request: Request<Body>) -> Response {
        let event = match InboundEvent::from_request(request, self.inner.body_limit).await {
            Ok(event) => event,
            Err(err) => return normalize(err).into_response(),
        };

        let guard = event.disconnect_guard();
        let result = self.handle(event).await;
        guard.disarm();

        match result {
            Ok(value) => Json(value).into_response(),
            Err(err) => err.into_response(),
        }
    }

    /// Mount this handler on an axum route answering `inbound`.
    pub fn into_method_router<S>(self, inbound: FetchMethod) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        on(inbound.method_filter(), move |request: Request<Body>| {
            let handler = self.clone();
            async move { handler.serve(request).await }
        })
    }
}

fn log_failure(request_id: &str, path: &str, err: &NormalizedError) {
    let status = err.status_code.as_u16();
    if err.status_code.is_server_error() {
        tracing::error!(
            request_id = %request_id,
            path = %path,
            status,
            status_message = %err.status_message,
            error = %err.original_error(),
            "Backend handler failed"
        );
    } else {
        tracing::warn!(
            request_id = %request_id,
            path = %path,
            status,
            status_message = %err.status_message,
            error = %err.original_error(),
            "Backend handler rejected request"
        );
    }
}
