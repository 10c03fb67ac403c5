use serde_json::json;

use super::*;
use crate::net::api::CONNECT;
use crate::net::test_support::{MockTransport, context_with};

#[tokio::test]
async fn blank_field_makes_no_call() {
    let mock = MockTransport::new();
    let ctx = context_with(&mock);
    let err = connect(&ctx, "https://acme.atlassian.net", "  ", "token").await.unwrap_err();
    assert_eq!(err, ClientError::Validation(ValidationError::MissingConnectFields));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn connect_returns_user() {
    let mock = MockTransport::new();
    mock.ok(CONNECT, json!({ "success": true, "user": { "displayName": "Ada", "email": "ada@example.com" } }));
    let ctx = context_with(&mock);

    let user = connect(&ctx, " https://acme.atlassian.net ", "ada@example.com", "token").await.unwrap();

    assert_eq!(user.display_name, "Ada");
    assert_eq!(
        mock.calls_to(CONNECT)[0].body,
        Some(json!({ "jira_url": "https://acme.atlassian.net", "email": "ada@example.com", "api_token": "token" }))
    );
}

#[tokio::test]
async fn rejected_connect_keeps_server_message() {
    let mock = MockTransport::new();
    mock.fail(CONNECT, 401, "Invalid credentials");
    let ctx = context_with(&mock);
    let err = connect(&ctx, "https://acme.atlassian.net", "a@b.c", "bad").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn rejected_connect_without_text_names_status() {
    let mock = MockTransport::new();
    mock.fail(CONNECT, 502, "request failed (502)");
    let ctx = context_with(&mock);
    let err = connect(&ctx, "https://acme.atlassian.net", "a@b.c", "t").await.unwrap_err();
    assert_eq!(err.to_string(), "Connection failed (502)");
}
