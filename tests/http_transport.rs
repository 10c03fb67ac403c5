//! End-to-end checks of `HttpTransport` against a local axum stub.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use reqwest::Method;
use scenario_desk::net::api::BackendApi;
use scenario_desk::net::transport::{HttpTransport, Transport, TransportError};
use serde_json::{Value, json};

fn stub_app() -> Router {
    Router::new()
        .route("/api/ai/has_key", get(|| async { Json(json!({ "has_key": true })) }))
        .route("/echo", post(|Json(body): Json<Value>| async move { Json(json!({ "received": body })) }))
        .route("/empty", post(|| async { StatusCode::OK }))
        .route(
            "/api/generate_test_scenarios",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "AI service down" }))) }),
        )
        .route("/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>") }))
        .route("/messaged", get(|| async { (StatusCode::BAD_REQUEST, Json(json!({ "message": "Bad input" }))) }))
        .route(
            "/login",
            post(|| async { ([(header::SET_COOKIE, "session=abc123; Path=/")], Json(json!({ "success": true }))) }),
        )
        .route(
            "/whoami",
            get(|headers: HeaderMap| async move {
                let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()).unwrap_or("").to_owned();
                Json(json!({ "cookie": cookie }))
            }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        )
}

async fn spawn_stub() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, stub_app()).await.unwrap();
    });
    addr
}

fn transport(addr: SocketAddr) -> HttpTransport {
    HttpTransport::new(&format!("http://{addr}/"), Duration::from_secs(5), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn success_body_is_decoded() {
    let addr = spawn_stub().await;
    let api = BackendApi::new(Arc::new(transport(addr)));
    assert!(api.has_key().await.unwrap());
}

#[tokio::test]
async fn json_body_is_sent() {
    let addr = spawn_stub().await;
    let value = transport(addr)
        .call(Method::POST, "/echo", Some(json!({ "message": "Hello" })))
        .await
        .unwrap();
    assert_eq!(value, json!({ "received": { "message": "Hello" } }));
}

#[tokio::test]
async fn empty_body_becomes_empty_object() {
    let addr = spawn_stub().await;
    let value = transport(addr).call(Method::POST, "/empty", None).await.unwrap();
    assert_eq!(value, json!({}));
}

#[tokio::test]
async fn error_body_text_is_kept() {
    let addr = spawn_stub().await;
    let err = transport(addr)
        .call(Method::POST, "/api/generate_test_scenarios", Some(json!({ "description": "Do X" })))
        .await
        .unwrap_err();
    assert_eq!(err, TransportError::Application { status: 503, message: "AI service down".to_owned() });
}

#[tokio::test]
async fn message_field_is_used_when_error_is_absent() {
    let addr = spawn_stub().await;
    let err = transport(addr).call(Method::GET, "/messaged", None).await.unwrap_err();
    assert_eq!(err.to_string(), "Bad input");
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn non_json_error_gets_generic_message() {
    let addr = spawn_stub().await;
    let err = transport(addr).call(Method::GET, "/broken", None).await.unwrap_err();
    assert_eq!(err, TransportError::Application { status: 500, message: "request failed (500)".to_owned() });
}

#[tokio::test]
async fn session_cookie_is_replayed() {
    let addr = spawn_stub().await;
    let transport = transport(addr);
    transport.call(Method::POST, "/login", None).await.unwrap();
    let value = transport.call(Method::GET, "/whoami", None).await.unwrap();
    assert_eq!(value["cookie"], "session=abc123");
}

#[tokio::test]
async fn refused_connection_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = transport(addr).call(Method::GET, "/api/ai/has_key", None).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)), "got {err:?}");
    assert!(err.is_network());
}

#[tokio::test]
async fn slow_response_times_out() {
    let addr = spawn_stub().await;
    let transport =
        HttpTransport::new(&format!("http://{addr}"), Duration::from_millis(100), Duration::from_secs(2)).unwrap();
    let err = transport.call(Method::GET, "/slow", None).await.unwrap_err();
    assert_eq!(err, TransportError::Timeout(Duration::from_millis(100)));
}
