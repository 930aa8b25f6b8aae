//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, apply API_URL override)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → RuntimeConfig injected into every compiled handler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Handlers receive configuration explicitly, never from globals

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, AuthMode, BackendConfig, ListenerConfig, ObservabilityConfig, ProxyConfig,
    RouteConfig, RuntimeConfig, TimeoutConfig,
};
