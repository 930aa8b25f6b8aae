//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect conflicting routes, including the built-in health and ping endpoints
//! - Reject mount paths the router cannot parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - A missing `api_url` is not an error here: handlers fail per request
//!   with a configuration error so the server can still start

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::pipeline::FetchMethod;

/// Paths the server mounts for GET itself.
pub const RESERVED_GET_PATHS: [&str; 2] = ["/health", "/ping"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid api_url '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("timeout '{0}' must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("route '{route}': {field} '{value}' must start with '/'")]
    InvalidRoutePath {
        route: String,
        field: &'static str,
        value: String,
    },

    #[error("route '{route}': GET {path} is reserved for a built-in endpoint")]
    ReservedRoute { route: String, path: String },

    #[error("route '{route}': invalid path '{path}': {reason}")]
    InvalidRouteSyntax {
        route: String,
        path: String,
        reason: &'static str,
    },

    #[error("route '{route}': {method} {path} is already mounted")]
    DuplicateRoute {
        route: String,
        method: String,
        path: String,
    },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Some(api_url) = config.runtime().api_url() {
        match url::Url::parse(api_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::InvalidApiUrl {
                url: api_url.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidApiUrl {
                url: api_url.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    let mut mounted = HashSet::new();
    for route in &config.routes {
        for (field, value) in [("path", &route.path), ("upstream", &route.upstream)] {
            if !value.starts_with('/') {
                errors.push(ValidationError::InvalidRoutePath {
                    route: route.name.clone(),
                    field,
                    value: value.clone(),
                });
            }
        }

        if let Some(reason) = path_syntax_error(&route.path) {
            errors.push(ValidationError::InvalidRouteSyntax {
                route: route.name.clone(),
                path: route.path.clone(),
                reason,
            });
        }

        if route.inbound_method() == FetchMethod::Get
            && RESERVED_GET_PATHS.contains(&route.path.as_str())
        {
            errors.push(ValidationError::ReservedRoute {
                route: route.name.clone(),
                path: route.path.clone(),
            });
        }

        if !mounted.insert((route.path.clone(), route.inbound_method())) {
            errors.push(ValidationError::DuplicateRoute {
                route: route.name.clone(),
                method: route.inbound_method().to_string(),
                path: route.path.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Mount-path problems the router would otherwise panic on.
fn path_syntax_error(path: &str) -> Option<&'static str> {
    for segment in path.split('/') {
        if segment.starts_with(':') || segment.starts_with('*') {
            return Some("captures use '{name}' syntax");
        }

        let mut open = false;
        for c in segment.chars() {
            match (c, open) {
                ('{', false) => open = true,
                ('}', true) => open = false,
                ('{', true) | ('}', false) => return Some("unbalanced braces"),
                _ => {}
            }
        }
        if open {
            return Some("unbalanced braces");
        }
    }
    None
}
