//! End-to-end pipeline tests against a mock backend over real HTTP.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use backend_proxy::auth::{auth_handler, StaticIdentityProvider};
use backend_proxy::config::RuntimeConfig;
use backend_proxy::pipeline::{extract_event_body, BackendContext, FetchMethod, HandlerBuilder, InboundEvent};
use backend_proxy::ProxyError;

fn context(api_url: String) -> BackendContext {
    BackendContext::new(RuntimeConfig::with_api_url(api_url))
}

fn event(method: Method, body: &'static str) -> InboundEvent {
    InboundEvent::new(
        method,
        Uri::from_static("/api/users"),
        HeaderMap::new(),
        Bytes::from_static(body.as_bytes()),
    )
}

#[tokio::test]
async fn authenticated_get_forwards_bearer_and_no_body() {
    let backend = common::start_mock_backend(StatusCode::OK, r#"[{"id":1}]"#).await;

    let handler = auth_handler(
        context(backend.url()),
        Arc::new(StaticIdentityProvider::authenticated("abc")),
    )
    .with_method(FetchMethod::Get)
    .build("/users");

    let out = handler.handle(event(Method::GET, "")).await.unwrap();
    assert_eq!(out, json!([{"id": 1}]));

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let seen = &requests[0];
    assert_eq!(seen.method, Method::GET);
    assert_eq!(seen.uri.path(), "/users");
    assert_eq!(seen.header("authorization"), Some("Bearer abc"));
    assert_eq!(seen.header("content-type"), Some("application/json"));
    assert!(seen.header("x-request-id").is_some());
    assert!(seen.body.is_empty());
}

#[tokio::test]
async fn backend_404_is_preserved() {
    let backend = common::start_mock_backend(StatusCode::NOT_FOUND, r#"{"message":"not found"}"#).await;

    let handler = HandlerBuilder::new(context(backend.url()))
        .with_method(FetchMethod::Get)
        .build("/users/99");

    let err = handler.handle(event(Method::GET, "")).await.unwrap_err();
    assert_eq!(err.status_code, StatusCode::NOT_FOUND);
    assert_eq!(err.status_message, "not found");
    assert_eq!(err.message, "not found");
    assert_eq!(
        serde_json::to_value(err.body()).unwrap(),
        json!({"statusCode": 404, "statusMessage": "not found", "message": "not found"})
    );
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct NewUser {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: u64,
}

#[tokio::test]
async fn typed_post_passes_body_and_maps_response() {
    let backend = common::start_mock_backend(StatusCode::CREATED, r#"{"id":7}"#).await;

    let handler = HandlerBuilder::new(context(backend.url()))
        .with_body_provider(extract_event_body::<NewUser>())
        .extend_fetch_options(|options| async move { Ok(options.with_header("X-Tenant", "acme")) })
        .post_map(|created: Value| async move {
            let created: Created = serde_json::from_value(created)?;
            Ok::<_, ProxyError>(created.id)
        })
        .build("/users");

    let id = handler.handle(event(Method::POST, r#"{"name":"ada"}"#)).await.unwrap();
    assert_eq!(id, 7);

    let seen = &backend.requests()[0];
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.header("x-tenant"), Some("acme"));
    let sent: NewUser = serde_json::from_slice(&seen.body).unwrap();
    assert_eq!(sent, NewUser { name: "ada".into() });
}

#[tokio::test]
async fn unreachable_backend_is_500() {
    // Bind and drop to get a port nothing listens on.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let handler = HandlerBuilder::new(context(format!("http://{addr}")))
        .with_method(FetchMethod::Get)
        .build("/users");

    let err = handler.handle(event(Method::GET, "")).await.unwrap_err();
    assert_eq!(err.status_code, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.status_message, "Backend Communication Error");
    assert!(matches!(err.original_error(), ProxyError::Network(_)));
}

#[tokio::test]
async fn disconnect_aborts_in_flight_call() {
    let backend =
        common::start_delayed_backend(StatusCode::OK, "{}", Duration::from_secs(10)).await;

    let handler = HandlerBuilder::new(context(backend.url()))
        .with_method(FetchMethod::Get)
        .build("/slow");

    let inbound = event(Method::GET, "");
    let disconnect = inbound.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        disconnect.disconnect();
    });

    let err = tokio::time::timeout(Duration::from_secs(5), handler.handle(inbound))
        .await
        .expect("call should be aborted well before the backend answers")
        .unwrap_err();
    assert!(matches!(err.original_error(), ProxyError::Cancelled));
}
