//! Route table: compiled backend handlers mounted on an axum router.

use std::sync::Arc;

use axum::Router;
use serde::Serialize;

use crate::auth::{with_bearer_auth, IdentityProvider};
use crate::config::{AuthMode, ProxyConfig, RouteConfig};
use crate::pipeline::{BackendContext, BackendHandler, FetchMethod, HandlerBuilder, Payload};

/// Accumulates handlers and mounts them at `(path, method)`.
#[derive(Debug, Default)]
pub struct RouteTable {
    router: Router,
    mounted: usize,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `handler` at `path`, answering `inbound`.
    pub fn mount<B, R, T>(self, path: &str, inbound: FetchMethod, handler: BackendHandler<B, R, T>) -> Self
    where
        B: Payload,
        R: Send + 'static,
        T: Serialize + Send + 'static,
    {
        tracing::debug!(path = %path, method = %inbound, upstream = %handler.path(), "Mounting route");
        Self {
            router: self.router.route(path, handler.into_method_router(inbound)),
            mounted: self.mounted + 1,
        }
    }

    /// Mount every configured route. Routes requiring auth get the bearer
    /// extender unless auth is disabled.
    pub fn from_config(
        config: &ProxyConfig,
        context: &BackendContext,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        config.routes.iter().fold(Self::new(), |table, route| {
            let authenticated = route.auth && config.auth.mode == AuthMode::Passthrough;
            let handler = compile_route(route, context, authenticated.then(|| Arc::clone(&provider)))
                .with_body_limit(config.listener.max_body_bytes);

            tracing::info!(
                route = %route.name,
                path = %route.path,
                method = %route.inbound_method(),
                upstream = %route.upstream,
                upstream_method = %route.method,
                auth = authenticated,
                "Route configured"
            );
            table.mount(&route.path, route.inbound_method(), handler)
        })
    }

    pub fn len(&self) -> usize {
        self.mounted
    }

    pub fn is_empty(&self) -> bool {
        self.mounted == 0
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

fn compile_route(
    route: &RouteConfig,
    context: &BackendContext,
    provider: Option<Arc<dyn IdentityProvider>>,
) -> BackendHandler<serde_json::Value, serde_json::Value, serde_json::Value> {
    let builder = HandlerBuilder::new(context.clone()).with_method(route.method);
    match provider {
        Some(provider) => with_bearer_auth(&builder, provider).build(route.upstream.as_str()),
        None => builder.build(route.upstream.as_str()),
    }
}
