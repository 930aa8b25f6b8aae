//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `backend.api_url`.
pub const API_URL_ENV: &str = "API_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, applying env overrides.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    prepare_config(Some(path), None)
}

/// Build the effective configuration: file (or defaults), then `API_URL`,
/// then an explicit `api_url`, then validation of the result.
pub fn prepare_config(
    path: Option<&Path>,
    api_url: Option<String>,
) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config);
    apply_api_url_override(&mut config, api_url);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file without overrides or validation.
pub fn read_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply overrides from the process environment. Returns whether one applied.
pub fn apply_env_overrides(config: &mut ProxyConfig) -> bool {
    apply_api_url_override(config, std::env::var(API_URL_ENV).ok())
}

/// Replace `backend.api_url` when an override is present and non-empty.
pub fn apply_api_url_override(config: &mut ProxyConfig, api_url: Option<String>) -> bool {
    match api_url.filter(|u| !u.trim().is_empty()) {
        Some(url) => {
            config.backend.api_url = Some(url);
            true
        }
        None => false,
    }
}
