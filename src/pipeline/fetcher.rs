//! Fetchers: the leaf I/O stage that calls the backend.
//!
//! # Responsibilities
//! - Serialize the request body as JSON (omit it when there is none)
//! - Issue the call with method, URL and headers
//! - Abort when the inbound request's cancellation token fires
//! - Translate non-success statuses and transport failures into typed errors

use std::future::Future;
use std::sync::Arc;

use axum::http::{header::CONTENT_TYPE, StatusCode};
use futures_util::future::{BoxFuture, FutureExt};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::event::X_REQUEST_ID;
use super::request::RequestDescription;
use crate::error::{ProxyError, ProxyResult};

/// Performs the backend call for a fully-resolved request description.
pub type Fetcher<B, R> =
    Arc<dyn Fn(RequestDescription<B>) -> BoxFuture<'static, ProxyResult<R>> + Send + Sync>;

/// Wrap an async closure as a [`Fetcher`].
pub fn fetcher<B, R, F, Fut>(f: F) -> Fetcher<B, R>
where
    F: Fn(RequestDescription<B>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ProxyResult<R>> + Send + 'static,
{
    Arc::new(move |options| f(options).boxed())
}

/// Default outbound caller backed by a shared `reqwest` client.
pub fn default_fetcher<B, R>(client: reqwest::Client) -> Fetcher<B, R>
where
    B: Serialize + Send + 'static,
    R: DeserializeOwned + Send + 'static,
{
    fetcher(move |options: RequestDescription<B>| {
        let client = client.clone();
        async move { fetch_json(&client, options).await }
    })
}

/// Call the backend and decode the JSON response, aborting on client disconnect.
pub async fn fetch_json<B, R>(client: &reqwest::Client, options: RequestDescription<B>) -> ProxyResult<R>
where
    B: Serialize,
    R: DeserializeOwned,
{
    let cancellation = options.event.cancellation().clone();
    let request_id = options.event.request_id().to_string();
    let url = options.url.clone();

    tokio::select! {
        biased;
        _ = cancellation.cancelled() => {
            tracing::debug!(request_id = %request_id, url = %url, "Client disconnected, aborting backend call");
            Err(ProxyError::Cancelled)
        }
        result = send(client, options) => result,
    }
}

async fn send<B, R>(client: &reqwest::Client, options: RequestDescription<B>) -> ProxyResult<R>
where
    B: Serialize,
    R: DeserializeOwned,
{
    let mut request = client.request(options.method.to_http(), &options.url);

    for (name, value) in &options.headers {
        request = request.header(name.as_str(), value.as_str());
    }
    if !options.headers.keys().any(|k| k.eq_ignore_ascii_case(X_REQUEST_ID)) {
        request = request.header(X_REQUEST_ID, options.event.request_id());
    }
    if let Some(body) = &options.body {
        request = request.body(serde_json::to_vec(body)?);
    }

    tracing::debug!(
        request_id = %options.event.request_id(),
        method = %options.method,
        url = %options.url,
        "Calling backend"
    );

    let response = request.send().await.map_err(ProxyError::Network)?;
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await.map_err(ProxyError::Network)?;

    if !status.is_success() {
        let message = upstream_message(status, &bytes);
        tracing::debug!(status = %status, message = %message, "Backend returned error status");
        return Err(ProxyError::BackendCall { status, message });
    }

    decode_body(&bytes, content_type.as_deref())
}

/// Decode a success body: empty is `null`, non-JSON text is a JSON string.
fn decode_body<R: DeserializeOwned>(bytes: &[u8], content_type: Option<&str>) -> ProxyResult<R> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(Value::Null)?);
    }

    let is_json = content_type.map(|ct| ct.contains("json")).unwrap_or(false);
    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(e) if is_json => Err(e.into()),
        Err(_) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            Ok(serde_json::from_value(Value::String(text))?)
        }
    }
}

/// Best human-readable message from an upstream error body.
fn upstream_message(status: StatusCode, bytes: &[u8]) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(bytes) {
        for key in ["message", "statusMessage", "error"] {
            if let Some(Value::String(s)) = map.get(key) {
                if !s.is_empty() {
                    return s.clone();
                }
            }
        }
    }

    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Backend Communication Error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upstream_message_prefers_json_message_field() {
        let msg = upstream_message(StatusCode::NOT_FOUND, br#"{"message":"not found"}"#);
        assert_eq!(msg, "not found");

        let msg = upstream_message(StatusCode::BAD_REQUEST, br#"{"error":"bad id"}"#);
        assert_eq!(msg, "bad id");
    }

    #[test]
    fn upstream_message_falls_back_to_text_then_reason() {
        assert_eq!(upstream_message(StatusCode::NOT_FOUND, b"not found\n"), "not found");
        assert_eq!(upstream_message(StatusCode::BAD_GATEWAY, b""), "Bad Gateway");
    }

    #[test]
    fn decodes_json_text_and_empty_bodies() {
        let v: Value = decode_body(br#"[{"id":1}]"#, Some("application/json")).unwrap();
        assert_eq!(v, json!([{"id": 1}]));

        let v: Value = decode_body(b"pong", Some("text/plain")).unwrap();
        assert_eq!(v, json!("pong"));

        let v: Option<Value> = decode_body(b"", None).unwrap();
        assert!(v.is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = decode_body::<Value>(b"{oops", Some("application/json")).unwrap_err();
        assert!(matches!(err, ProxyError::Serialization(_)));
    }
}
