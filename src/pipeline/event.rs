//! Inbound request handle.
//!
//! # Responsibilities
//! - Carry method, URI, headers and the buffered body of one inbound request
//! - Expose a request ID for log correlation
//! - Own the cancellation token tied to the inbound connection's lifetime

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{request::Parts, HeaderMap, Method, Request, Uri},
};
use serde::de::DeserializeOwned;
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use crate::error::ProxyError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Default inbound body limit (2MB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Handle to one inbound request, shared by every stage of its pipeline run.
///
/// Cloning is cheap; all clones observe the same cancellation token.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    inner: Arc<EventInner>,
}

#[derive(Debug)]
struct EventInner {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    request_id: String,
    cancellation: CancellationToken,
}

impl InboundEvent {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        let request_id = headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            inner: Arc::new(EventInner {
                method,
                uri,
                headers,
                body,
                request_id,
                cancellation: CancellationToken::new(),
            }),
        }
    }

    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self::new(parts.method, parts.uri, parts.headers, body)
    }

    /// Buffer an axum request into an event, rejecting bodies over `limit` bytes.
    pub async fn from_request(request: Request<Body>, limit: usize) -> Result<Self, ProxyError> {
        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, limit)
            .await
            .map_err(|e| ProxyError::InvalidBody(e.to_string()))?;
        Ok(Self::from_parts(parts, bytes))
    }

    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn raw_body(&self) -> &Bytes {
        &self.inner.body
    }

    pub fn request_id(&self) -> &str {
        &self.inner.request_id
    }

    /// Parse the buffered body as JSON. An empty body yields `None`.
    pub fn read_body<T: DeserializeOwned>(&self) -> Result<Option<T>, ProxyError> {
        if self.inner.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&self.inner.body)
            .map(Some)
            .map_err(|e| ProxyError::InvalidBody(e.to_string()))
    }

    /// Token that fires when the inbound connection goes away.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.inner.cancellation
    }

    /// Signal that the client disconnected. Idempotent.
    pub fn disconnect(&self) {
        self.inner.cancellation.cancel();
    }

    pub fn is_disconnected(&self) -> bool {
        self.inner.cancellation.is_cancelled()
    }

    /// Guard that fires the cancellation token when dropped.
    ///
    /// Hold it inside the request future: hyper drops that future when the
    /// client disconnects. Disarm it once a response has been produced.
    pub fn disconnect_guard(&self) -> DropGuard {
        self.inner.cancellation.clone().drop_guard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn event_with_body(body: &'static str) -> InboundEvent {
        InboundEvent::new(
            Method::POST,
            Uri::from_static("/users"),
            HeaderMap::new(),
            Bytes::from_static(body.as_bytes()),
        )
    }

    #[test]
    fn reads_json_body() {
        let event = event_with_body(r#"{"name":"ada"}"#);
        let body: Option<Value> = event.read_body().unwrap();
        assert_eq!(body, Some(json!({"name": "ada"})));
    }

    #[test]
    fn empty_body_is_none() {
        let body: Option<Value> = event_with_body("  ").read_body().unwrap();
        assert!(body.is_none());
    }

    #[test]
    fn malformed_body_is_400() {
        let err = event_with_body("{nope").read_body::<Value>().unwrap_err();
        assert!(matches!(err, ProxyError::InvalidBody(_)));
    }

    #[test]
    fn request_id_is_taken_from_header_or_generated() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, "req-42".parse().unwrap());
        let event = InboundEvent::new(Method::GET, Uri::from_static("/"), headers, Bytes::new());
        assert_eq!(event.request_id(), "req-42");

        let generated = event_with_body("");
        assert!(Uuid::parse_str(generated.request_id()).is_ok());
    }

    #[test]
    fn drop_guard_fires_cancellation_for_all_clones() {
        let event = event_with_body("");
        let clone = event.clone();
        {
            let _guard = event.disconnect_guard();
            assert!(!clone.is_disconnected());
        }
        assert!(clone.is_disconnected());
    }
}
