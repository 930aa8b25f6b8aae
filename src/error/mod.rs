//! Error taxonomy for the proxy pipeline.
//!
//! # Data Flow
//! ```text
//! any pipeline stage (body, auth, extender, fetcher, transformer)
//!     → ProxyError (propagated with `?`, never translated in place)
//!     → handler boundary
//!     → normalizer.rs (single reshaping pass)
//!     → NormalizedError → host framework error response
//! ```
//!
//! # Design Decisions
//! - Stages raise typed errors; only the boundary turns them into responses
//! - Errors that carry an HTTP status keep it through normalization
//! - Everything else becomes a 500 "Backend Communication Error"

pub mod normalizer;

use std::borrow::Cow;

use axum::http::StatusCode;
use thiserror::Error;

pub use normalizer::{normalize, NormalizedError};

/// Status phrase used when an error carries no status of its own.
pub const DEFAULT_STATUS_MESSAGE: &str = "Backend Communication Error";

/// Message used when an error has nothing human-readable to offer.
pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred";

/// Errors raised by any stage of a backend handler.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Deployment misconfiguration (e.g. no backend base URL).
    #[error("{0}")]
    Configuration(String),

    /// No session, no token, or no access token on the session.
    #[error("You must be logged in to access this resource.")]
    Unauthenticated,

    /// The session layer failed to refresh the access token.
    #[error("Authentication tokens have expired and could not be refreshed. Please sign in again.")]
    AuthRefresh,

    /// The backend answered with a non-success status.
    #[error("{message}")]
    BackendCall { status: StatusCode, message: String },

    /// The backend could not be reached (DNS, connection reset, timeout).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The inbound client went away before the backend answered.
    #[error("Request cancelled: client disconnected")]
    Cancelled,

    /// The inbound body could not be read or parsed.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// An explicit HTTP error raised by a custom stage.
    #[error("{message}")]
    Http {
        status: StatusCode,
        status_message: String,
        message: String,
    },

    /// An error that already went through the normalizer.
    #[error("{0}")]
    Normalized(Box<NormalizedError>),

    /// JSON encoding or decoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A plain message with no further structure.
    #[error("{0}")]
    Message(String),

    /// Any other error type raised by a custom stage.
    #[error("{0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Failure with no usable description.
    #[error("An unexpected error occurred")]
    Unknown,
}

impl ProxyError {
    /// Build an explicit HTTP error, the way a custom stage rejects a request.
    pub fn http(
        status: StatusCode,
        status_message: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Http {
            status,
            status_message: status_message.into(),
            message: message.into(),
        }
    }

    /// Wrap an arbitrary error.
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other(Box::new(err))
    }

    /// The status code and status phrase this error carries, if any.
    pub fn status(&self) -> Option<(StatusCode, Cow<'_, str>)> {
        match self {
            ProxyError::Unauthenticated => {
                Some((StatusCode::UNAUTHORIZED, Cow::Borrowed("Unauthorized")))
            }
            ProxyError::AuthRefresh => Some((
                StatusCode::UNAUTHORIZED,
                Cow::Borrowed("Token Refresh Failed"),
            )),
            ProxyError::BackendCall { status, message } => {
                Some((*status, Cow::Borrowed(message.as_str())))
            }
            ProxyError::Network(e) => e.status().map(|status| {
                (
                    status,
                    Cow::Borrowed(status.canonical_reason().unwrap_or(DEFAULT_STATUS_MESSAGE)),
                )
            }),
            ProxyError::InvalidBody(_) => {
                Some((StatusCode::BAD_REQUEST, Cow::Borrowed("Bad Request")))
            }
            ProxyError::Http {
                status,
                status_message,
                ..
            } => Some((*status, Cow::Borrowed(status_message.as_str()))),
            ProxyError::Normalized(n) => {
                Some((n.status_code, Cow::Borrowed(n.status_message.as_str())))
            }
            ProxyError::Configuration(_)
            | ProxyError::Cancelled
            | ProxyError::Serialization(_)
            | ProxyError::Message(_)
            | ProxyError::Other(_)
            | ProxyError::Unknown => None,
        }
    }
}

impl From<String> for ProxyError {
    fn from(message: String) -> Self {
        ProxyError::Message(message)
    }
}

impl From<&str> for ProxyError {
    fn from(message: &str) -> Self {
        ProxyError::Message(message.to_string())
    }
}

impl From<NormalizedError> for ProxyError {
    fn from(err: NormalizedError) -> Self {
        ProxyError::Normalized(Box::new(err))
    }
}

/// Result type for pipeline stages.
pub type ProxyResult<T> = Result<T, ProxyError>;
