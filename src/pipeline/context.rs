//! Shared resources every builder and compiled handler draws on.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConfigError, ProxyConfig, RuntimeConfig};

/// Runtime configuration plus the outbound HTTP client.
///
/// Injected into builders at construction; handlers never look configuration
/// up from ambient state.
#[derive(Debug, Clone)]
pub struct BackendContext {
    runtime: Arc<RuntimeConfig>,
    client: reqwest::Client,
}

impl BackendContext {
    pub fn new(runtime: RuntimeConfig) -> Self {
        Self::with_client(runtime, reqwest::Client::new())
    }

    pub fn with_client(runtime: RuntimeConfig, client: reqwest::Client) -> Self {
        Self {
            runtime: Arc::new(runtime),
            client,
        }
    }

    /// Build the context from a loaded configuration, applying its timeouts
    /// to the outbound client.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .build()?;

        Ok(Self::with_client(config.runtime(), client))
    }

    pub fn runtime(&self) -> &RuntimeConfig {
        &self.runtime
    }

    pub(crate) fn shared_runtime(&self) -> Arc<RuntimeConfig> {
        Arc::clone(&self.runtime)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}
