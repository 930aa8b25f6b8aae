//! Backend proxy: composable handlers that forward inbound requests to a
//! remote JSON API with auth, body extraction and uniform error reporting.

// Core subsystems
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use auth::{auth_handler, define_backend_handler, IdentityProvider};
pub use config::schema::ProxyConfig;
pub use error::{normalize, NormalizedError, ProxyError, ProxyResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{backend_handler_builder, BackendContext, BackendHandler, HandlerBuilder};
