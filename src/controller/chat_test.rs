use std::time::Duration;

use serde_json::json;

use super::*;
use crate::background::Background;
use crate::net::api::{AI_CHAT, AI_CLEAR_KEY, AI_CLEAR_SESSION, AI_HAS_KEY, AI_SET_KEY, LOG_EVENT};
use crate::net::test_support::{MockTransport, Reply, api_with, context_with};
use crate::state::chat::PLACEHOLDER_TEXT;
use crate::telemetry::Telemetry;

fn controller(mock: &std::sync::Arc<MockTransport>) -> ChatController {
    ChatController::new(context_with(mock), RenderMode::Markdown)
}

// =============================================================
// send_message
// =============================================================

#[tokio::test]
async fn hello_round_trip_replaces_placeholder() {
    let mock = MockTransport::new();
    mock.ok(AI_CHAT, json!({ "response": "Hi there" }));
    let mut chat = controller(&mock);

    chat.send_message("Hello").await.unwrap();

    let messages = &chat.state().messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "Hello");
    assert_eq!(messages[1].text, "Hi there");
    assert_ne!(messages[1].text, PLACEHOLDER_TEXT);
    assert!(!messages[1].loading);
    assert_eq!(messages[1].actions, vec![MessageAction::Copy, MessageAction::Regenerate]);
    assert!(chat.state().send_enabled());
    assert_eq!(mock.calls_to(AI_CHAT)[0].body, Some(json!({ "message": "Hello" })));
}

#[tokio::test]
async fn blank_message_makes_no_call() {
    let mock = MockTransport::new();
    let mut chat = controller(&mock);
    let err = chat.send_message("   ").await.unwrap_err();
    assert_eq!(err, ClientError::Validation(ValidationError::EmptyMessage));
    assert_eq!(mock.call_count(), 0);
    assert!(chat.state().messages.is_empty());
}

#[tokio::test]
async fn send_refused_while_awaiting() {
    let mock = MockTransport::new();
    let mut chat = controller(&mock);
    chat.state.begin_send("first").unwrap();
    let err = chat.send_message("second").await.unwrap_err();
    assert_eq!(err, ClientError::Validation(ValidationError::RequestInFlight));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn invalid_key_raises_sticky_banner() {
    let mock = MockTransport::new();
    mock.fail(AI_CHAT, 401, INVALID_API_KEY_MESSAGE);
    let mut chat = controller(&mock);

    chat.send_message("Hello").await.unwrap();

    assert_eq!(chat.state().messages[1].text, INVALID_API_KEY_MESSAGE);
    assert!(chat.state().messages[1].actions.is_empty());
    let banner = chat.state().banner.as_ref().unwrap();
    assert!(banner.sticky);
    assert_eq!(banner.tone, Tone::Danger);
    assert_eq!(banner.action, Some(BannerAction::ClearKey));
}

#[tokio::test]
async fn sticky_banner_outlives_next_send_but_transient_does_not() {
    let mock = MockTransport::new();
    mock.ok(AI_SET_KEY, json!({ "success": true }));
    mock.ok(AI_CHAT, json!({ "response": "Hi" }));
    mock.fail(AI_CHAT, 401, INVALID_API_KEY_MESSAGE);
    mock.ok(AI_CHAT, json!({ "response": "Hi again" }));
    let mut chat = controller(&mock);

    chat.save_key("sk-test").await.unwrap();
    assert_eq!(chat.state().banner.as_ref().unwrap().text, KEY_SAVED_TEXT);
    chat.send_message("Hello").await.unwrap();
    assert!(chat.state().banner.is_none());

    chat.send_message("Hello").await.unwrap();
    chat.send_message("Hello").await.unwrap();
    let banner = chat.state().banner.as_ref().unwrap();
    assert!(banner.sticky);
    assert_eq!(banner.action, Some(BannerAction::ClearKey));
}

#[tokio::test]
async fn in_band_error_becomes_placeholder_text() {
    let mock = MockTransport::new();
    mock.ok(AI_CHAT, json!({ "error": "Model overloaded" }));
    let mut chat = controller(&mock);
    chat.send_message("Hello").await.unwrap();
    assert_eq!(chat.state().messages[1].text, "Model overloaded");
    assert!(chat.state().banner.is_none());
}

#[tokio::test]
async fn network_failure_shows_unavailable() {
    let mock = MockTransport::new();
    mock.reply(AI_CHAT, Reply::Err(TransportError::Network("connection refused".into())));
    let mut chat = controller(&mock);
    chat.send_message("Hello").await.unwrap();
    assert_eq!(chat.state().messages[1].text, AI_UNAVAILABLE_TEXT);
    assert!(chat.state().send_enabled());
}

#[tokio::test]
async fn stuck_request_times_out_and_reenables_send() {
    let mock = MockTransport::new();
    mock.reply(AI_CHAT, Reply::Hang);
    let mut ctx = context_with(&mock);
    ctx.request_timeout = Duration::from_millis(20);
    let mut chat = ChatController::new(ctx, RenderMode::Text);

    chat.send_message("Hello").await.unwrap();

    assert_eq!(chat.state().messages[1].text, AI_UNAVAILABLE_TEXT);
    assert!(chat.state().send_enabled());
}

#[tokio::test]
async fn dropped_send_can_be_aborted() {
    let mock = MockTransport::new();
    mock.reply(AI_CHAT, Reply::Hang);
    let mut chat = controller(&mock);

    let sent = tokio::time::timeout(Duration::from_millis(20), chat.send_message("Hello")).await;
    assert!(sent.is_err());
    assert!(!chat.state().send_enabled());

    assert!(chat.abort_pending());
    assert!(chat.state().send_enabled());
}

#[test]
fn generic_status_error_names_the_status() {
    let error = TransportError::Application { status: 500, message: "request failed (500)".into() };
    assert_eq!(chat_error_text(&error), "AI error (500)");
}

// =============================================================
// regenerate / copy
// =============================================================

#[tokio::test]
async fn regenerate_resends_last_user_text() {
    let mock = MockTransport::new();
    mock.ok(AI_CHAT, json!({ "response": "one" }));
    mock.ok(AI_CHAT, json!({ "response": "two" }));
    let mut chat = controller(&mock);
    chat.send_message("Explain PROJ-1").await.unwrap();

    assert!(chat.regenerate().await.unwrap());

    let calls = mock.calls_to(AI_CHAT);
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].body, Some(json!({ "message": "Explain PROJ-1" })));
    assert_eq!(chat.state().messages.len(), 4);
}

#[tokio::test]
async fn regenerate_without_history_is_noop() {
    let mock = MockTransport::new();
    let mut chat = controller(&mock);
    assert!(!chat.regenerate().await.unwrap());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn copy_returns_raw_reply_text() {
    let mock = MockTransport::new();
    mock.ok(AI_CHAT, json!({ "response": "**bold** reply" }));
    let mut chat = controller(&mock);
    chat.send_message("Hello").await.unwrap();

    let user_id = chat.state().messages[0].id.clone();
    let reply_id = chat.state().messages[1].id.clone();
    assert_eq!(chat.copy_text(&reply_id).as_deref(), Some("**bold** reply"));
    assert_eq!(chat.copy_text(&user_id), None);
    assert_eq!(chat.copy_text("missing"), None);
}

// =============================================================
// key management
// =============================================================

#[tokio::test]
async fn open_checks_key_every_time() {
    let mock = MockTransport::new();
    mock.ok(AI_HAS_KEY, json!({ "has_key": true }));
    mock.ok(AI_HAS_KEY, json!({ "has_key": false }));
    let mut chat = controller(&mock);

    assert!(chat.check_key_and_open().await.unwrap());
    assert!(chat.state().panel_open);
    chat.close();

    assert!(!chat.check_key_and_open().await.unwrap());
    assert!(!chat.state().panel_open);
    assert_eq!(chat.state().banner.as_ref().unwrap().text, KEY_REQUIRED_TEXT);
    assert_eq!(mock.calls_to(AI_HAS_KEY).len(), 2);
}

#[tokio::test]
async fn save_key_validates_before_calling() {
    let mock = MockTransport::new();
    let mut chat = controller(&mock);
    let err = chat.save_key("  ").await.unwrap_err();
    assert_eq!(err, ClientError::Validation(ValidationError::EmptyApiKey));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn save_key_opens_panel() {
    let mock = MockTransport::new();
    mock.ok(AI_SET_KEY, json!({ "success": true }));
    let mut chat = controller(&mock);
    chat.save_key(" sk-test ").await.unwrap();
    assert!(chat.state().panel_open);
    assert_eq!(mock.calls_to(AI_SET_KEY)[0].body, Some(json!({ "api_key": "sk-test" })));
}

#[tokio::test]
async fn clear_key_replaces_invalid_key_banner() {
    let mock = MockTransport::new();
    mock.ok(AI_CLEAR_KEY, json!({ "success": true }));
    let mut chat = controller(&mock);
    chat.state.raise_banner(INVALID_API_KEY_BANNER, Tone::Danger, true, Some(BannerAction::ClearKey));

    chat.clear_key().await.unwrap();

    let banner = chat.state().banner.as_ref().unwrap();
    assert_eq!(banner.text, KEY_CLEARED_TEXT);
    assert!(!banner.sticky);
}

// =============================================================
// logout
// =============================================================

#[tokio::test]
async fn logout_wipes_conversation_when_both_succeed() {
    let mock = MockTransport::new();
    mock.ok(AI_CHAT, json!({ "response": "Hi" }));
    mock.ok(AI_CLEAR_KEY, json!({ "success": true }));
    mock.ok(AI_CLEAR_SESSION, json!({ "success": true, "cleared_items": ["ai_history"] }));
    let mut chat = controller(&mock);
    chat.state.panel_open = true;
    chat.send_message("Hello").await.unwrap();

    assert!(chat.logout().await);

    assert!(chat.state().messages.is_empty());
    assert!(!chat.state().panel_open);
    assert_eq!(chat.state().banner.as_ref().unwrap().text, LOGOUT_DONE_TEXT);
}

#[tokio::test]
async fn logout_is_all_or_nothing() {
    let mock = MockTransport::new();
    mock.ok(AI_CHAT, json!({ "response": "Hi" }));
    mock.ok(AI_CLEAR_KEY, json!({ "success": true }));
    mock.ok(AI_CLEAR_SESSION, json!({ "success": false }));
    let mut chat = controller(&mock);
    chat.state.panel_open = true;
    chat.send_message("Hello").await.unwrap();

    assert!(!chat.logout().await);

    assert_eq!(chat.state().messages.len(), 2);
    assert!(chat.state().panel_open);
    assert_eq!(chat.state().banner.as_ref().unwrap().text, LOGOUT_FAILED_TEXT);
}

#[tokio::test]
async fn logout_transport_error_keeps_state() {
    let mock = MockTransport::new();
    mock.ok(AI_CLEAR_KEY, json!({ "success": true }));
    mock.fail(AI_CLEAR_SESSION, 500, "session store down");
    let mut chat = controller(&mock);
    assert!(!chat.logout().await);
    assert_eq!(chat.state().banner.as_ref().unwrap().text, LOGOUT_ERROR_TEXT);
}

// =============================================================
// render mode / telemetry
// =============================================================

#[tokio::test]
async fn render_mode_change_is_not_retroactive() {
    let mock = MockTransport::new();
    mock.ok(AI_CHAT, json!({ "response": "**a**" }));
    mock.ok(AI_CHAT, json!({ "response": "**b**" }));
    let mut chat = controller(&mock);
    chat.send_message("one").await.unwrap();
    chat.set_render_mode(RenderMode::Text);
    chat.send_message("two").await.unwrap();

    assert!(chat.state().messages[1].rendered.contains("<strong>a</strong>"));
    assert_eq!(chat.state().messages[3].rendered, "**b**");
}

#[tokio::test]
async fn send_emits_telemetry() {
    let mock = MockTransport::new();
    mock.ok(AI_CHAT, json!({ "response": "Hi there" }));
    mock.ok(LOG_EVENT, json!({ "success": true }));
    mock.ok(LOG_EVENT, json!({ "success": true }));
    let (background, mut outcomes) = Background::with_outcomes();
    let telemetry = Telemetry::direct(api_with(&mock), background.clone());
    let ctx = ClientContext::new(api_with(&mock), telemetry, background, Duration::from_secs(5));
    let mut chat = ChatController::new(ctx, RenderMode::Markdown);

    chat.send_message("Hello").await.unwrap();
    outcomes.recv().await.unwrap();
    outcomes.recv().await.unwrap();

    let mut events: Vec<String> = mock
        .calls_to(LOG_EVENT)
        .into_iter()
        .map(|c| c.body.unwrap()["event"].as_str().unwrap().to_owned())
        .collect();
    events.sort();
    assert_eq!(events, vec!["response_rendered", "send_message"]);
}
