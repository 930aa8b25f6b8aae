//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::pipeline::FetchMethod;

/// Root configuration for the backend proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Remote API the routes forward to.
    pub backend: BackendConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// How inbound requests are authenticated.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Forwarded route definitions.
    pub routes: Vec<RouteConfig>,
}

impl ProxyConfig {
    /// The slice of configuration handlers read at request time.
    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            api_url: self.backend.api_url.clone(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Remote API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL every route path is appended to. Overridden by `API_URL`.
    pub api_url: Option<String>,
}

/// Timeout configuration for the outbound client and inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Authentication mode for forwarded routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// No Authorization header is injected.
    Disabled,
    /// The inbound bearer credential is treated as the session access token.
    #[default]
    Passthrough,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A forwarded route: local mount path → backend path.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// Path the route is mounted at on this server.
    pub path: String,

    /// Path appended to `backend.api_url` for the outbound call.
    pub upstream: String,

    /// Verb for the outbound call.
    #[serde(default = "default_route_method")]
    pub method: FetchMethod,

    /// Verb the route answers to; defaults to `method`.
    #[serde(default)]
    pub inbound_method: Option<FetchMethod>,

    /// Require an authenticated session (ignored when auth is disabled).
    #[serde(default = "default_true")]
    pub auth: bool,
}

impl RouteConfig {
    pub fn inbound_method(&self) -> FetchMethod {
        self.inbound_method.unwrap_or(self.method)
    }
}

fn default_route_method() -> FetchMethod {
    FetchMethod::Get
}

fn default_true() -> bool {
    true
}

/// Configuration values handlers read on every invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub api_url: Option<String>,
}

impl RuntimeConfig {
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: Some(api_url.into()),
        }
    }

    /// Configured base URL, treating an empty string as absent.
    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.auth.mode, AuthMode::Passthrough);
        assert!(config.backend.api_url.is_none());
        assert!(config.routes.is_empty());
    }

    #[test]
    fn parses_routes() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [backend]
            api_url = "http://api.internal"

            [[routes]]
            name = "users"
            path = "/api/users"
            upstream = "/users"

            [[routes]]
            name = "create-user"
            path = "/api/users"
            upstream = "/users"
            method = "POST"
            auth = false
            "#,
        )
        .unwrap();

        assert_eq!(config.runtime().api_url(), Some("http://api.internal"));
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].method, FetchMethod::Get);
        assert!(config.routes[0].auth);
        assert_eq!(config.routes[1].inbound_method(), FetchMethod::Post);
        assert!(!config.routes[1].auth);
    }

    #[test]
    fn empty_api_url_counts_as_missing() {
        assert_eq!(RuntimeConfig::with_api_url("  ").api_url(), None);
        assert_eq!(RuntimeConfig::default().api_url(), None);
    }
}
