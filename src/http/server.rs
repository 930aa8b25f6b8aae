//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with configured backend routes
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve the health and ping endpoints
//! - Bind server to listener and drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{BearerPassthroughProvider, IdentityProvider};
use crate::config::validation::validate_config;
use crate::config::{ConfigError, ProxyConfig};
use crate::http::routes::RouteTable;
use crate::lifecycle::shutdown::wait_for;
use crate::pipeline::BackendContext;

/// HTTP server for the backend proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server whose authenticated routes trust inbound bearer tokens.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        Self::with_identity_provider(config, Arc::new(BearerPassthroughProvider))
    }

    pub fn with_identity_provider(
        config: ProxyConfig,
        provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let context = BackendContext::from_config(&config)?;
        let routes = RouteTable::from_config(&config, &context, provider);
        let runtime = config.runtime();

        tracing::info!(
            routes = routes.len(),
            api_url = runtime.api_url().unwrap_or("<unset>"),
            auth_mode = ?config.auth.mode,
            "Routes compiled"
        );

        let router = Self::build_router(&config, routes.into_router());
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, routes: Router) -> Router {
        routes
            .route("/health", get(health_handler))
            .route("/ping", get(ping_handler))
            .fallback(not_found_handler)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully-layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Echo endpoint: reports the inbound Authorization header.
async fn ping_handler(headers: HeaderMap) -> Json<Value> {
    let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    Json(json!({ "message": "pong", "auth": auth }))
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "No matching route found")
}
