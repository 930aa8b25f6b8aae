//! Error normalization at the handler boundary.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use super::{ProxyError, DEFAULT_STATUS_MESSAGE, FALLBACK_MESSAGE};

/// The uniform error shape surfaced to callers.
///
/// The original error travels along for logging but is never serialized.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct NormalizedError {
    pub status_code: StatusCode,
    pub status_message: String,
    pub message: String,
    original_error: Arc<ProxyError>,
}

/// Wire shape of a normalized error.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody<'a> {
    pub status_code: u16,
    pub status_message: &'a str,
    pub message: &'a str,
}

impl NormalizedError {
    /// Diagnostic payload: the error exactly as the failing stage raised it.
    pub fn original_error(&self) -> &ProxyError {
        &self.original_error
    }

    pub fn body(&self) -> ErrorBody<'_> {
        ErrorBody {
            status_code: self.status_code.as_u16(),
            status_message: &self.status_message,
            message: &self.message,
        }
    }
}

/// Reshape any pipeline failure into a [`NormalizedError`].
///
/// Carried status codes (>= 400) survive with their status phrase; anything
/// else becomes a 500 "Backend Communication Error". Never retries.
pub fn normalize(err: impl Into<ProxyError>) -> NormalizedError {
    let err = err.into();

    let (status_code, status_message) = match err.status() {
        Some((status, phrase)) if status.as_u16() >= 400 => (status, phrase.into_owned()),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            DEFAULT_STATUS_MESSAGE.to_string(),
        ),
    };

    let message = match err.to_string() {
        m if m.trim().is_empty() => FALLBACK_MESSAGE.to_string(),
        m => m,
    };

    NormalizedError {
        status_code,
        status_message,
        message,
        original_error: Arc::new(err),
    }
}

impl IntoResponse for NormalizedError {
    fn into_response(self) -> Response {
        (self.status_code, Json(self.body())).into_response()
    }
}
