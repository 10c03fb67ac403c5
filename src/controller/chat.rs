//! AI chat panel controller.
//!
//! SYSTEM CONTEXT
//! ==============
//! Drives [`ChatState`] against the `/api/ai/*` endpoints. The API key is
//! never cached: opening the panel asks the server every time. A reply error
//! equal to the backend's invalid-key text raises a sticky banner that offers
//! to clear the key.

use serde_json::json;
use tracing::{info, warn};

use super::{ClientContext, server_text};
use crate::error::{ClientError, ValidationError};
use crate::net::transport::TransportError;
use crate::net::types::UiEvent;
use crate::state::Tone;
use crate::state::chat::{
    BannerAction, ChatState, INVALID_API_KEY_BANNER, INVALID_API_KEY_MESSAGE, MessageAction, Role,
};
use crate::util::render::RenderMode;

pub const AI_UNAVAILABLE_TEXT: &str = "AI service unavailable";
pub const KEY_REQUIRED_TEXT: &str = "AI API key missing. Please set your API key first.";
pub const KEY_SAVED_TEXT: &str = "API key saved.";
pub const KEY_CLEARED_TEXT: &str = "AI key cleared";
pub const LOGOUT_DONE_TEXT: &str = "AI session ended successfully";
pub const LOGOUT_FAILED_TEXT: &str = "Failed to clear AI session";
pub const LOGOUT_ERROR_TEXT: &str = "Error ending AI session";

const CATEGORY: &str = "ai_chat";

pub struct ChatController {
    ctx: ClientContext,
    state: ChatState,
}

impl ChatController {
    #[must_use]
    pub fn new(ctx: ClientContext, render_mode: RenderMode) -> Self {
        Self { ctx, state: ChatState::new(render_mode) }
    }

    #[must_use]
    pub fn state(&self) -> &ChatState {
        &self.state
    }

    fn emit(&self, event: &str) {
        self.ctx.telemetry.emit(UiEvent::new(CATEGORY, event));
    }

    /// Fresh key check. Opens the panel when the server holds a key and
    /// returns whether it did.
    ///
    /// # Errors
    ///
    /// Transport failures while asking for the key.
    pub async fn check_key_and_open(&mut self) -> Result<bool, ClientError> {
        self.state.dismiss_transient_banner();
        let has_key = match self.ctx.bounded(self.ctx.api.has_key()).await {
            Ok(has_key) => has_key,
            Err(e) => {
                warn!(error = %e, "chat: key check failed");
                self.state.raise_banner("Unable to check AI key", Tone::Danger, false, None);
                return Err(e.into());
            }
        };

        if !has_key {
            self.emit("api_key_missing");
            self.state.raise_banner(KEY_REQUIRED_TEXT, Tone::Warning, false, None);
            return Ok(false);
        }

        self.open();
        Ok(true)
    }

    fn open(&mut self) {
        self.state.panel_open = true;
        self.ctx.telemetry.emit(UiEvent::new("ui", "ai_chat_open"));
    }

    pub fn close(&mut self) {
        self.state.panel_open = false;
        self.ctx.telemetry.emit(UiEvent::new("ui", "ai_chat_close"));
    }

    /// Store an API key in the server session and open the panel.
    ///
    /// # Errors
    ///
    /// `EmptyApiKey` for blank input (no request made), transport failures,
    /// or an application error when the server does not confirm.
    pub async fn save_key(&mut self, api_key: &str) -> Result<(), ClientError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ValidationError::EmptyApiKey.into());
        }

        match self.ctx.bounded(self.ctx.api.set_key(api_key)).await {
            Ok(ack) if ack.success => {
                info!("chat: api key saved");
                self.emit("api_key_saved");
                self.state.raise_banner(KEY_SAVED_TEXT, Tone::Success, false, None);
                self.open();
                Ok(())
            }
            Ok(ack) => {
                let message = ack.error.or(ack.message).unwrap_or_else(|| "Failed to save API key".to_owned());
                self.state.raise_banner(&message, Tone::Danger, false, None);
                Err(TransportError::Application { status: 200, message }.into())
            }
            Err(e) => {
                let text = if e.is_network() {
                    "Network error saving API key"
                } else {
                    server_text(&e).unwrap_or("Failed to save API key")
                };
                self.state.raise_banner(text, Tone::Danger, false, None);
                Err(e.into())
            }
        }
    }

    /// Post `text` and merge the reply into the placeholder. A failed reply
    /// is shown in the placeholder and still returns `Ok`.
    ///
    /// # Errors
    ///
    /// `EmptyMessage` or `RequestInFlight`, before any request is made.
    pub async fn send_message(&mut self, text: &str) -> Result<(), ClientError> {
        let message = self.state.begin_send(text)?;
        self.ctx.telemetry.emit(
            UiEvent::new(CATEGORY, "send_message").with_extra(json!({ "length": message.chars().count() })),
        );

        match self.ctx.bounded(self.ctx.api.chat(&message)).await {
            Ok(reply) => {
                self.state.complete_success(&reply);
                self.ctx.telemetry.emit(
                    UiEvent::new(CATEGORY, "response_rendered").with_extra(json!({ "length": reply.chars().count() })),
                );
            }
            Err(e) => {
                let error_text = chat_error_text(&e);
                warn!(error = %e, "chat: reply failed");
                if error_text == INVALID_API_KEY_MESSAGE {
                    self.state
                        .raise_banner(INVALID_API_KEY_BANNER, Tone::Danger, true, Some(BannerAction::ClearKey));
                    self.emit("invalid_api_key");
                }
                self.state.complete_error(&error_text);
                self.ctx.telemetry.emit(
                    UiEvent::new(CATEGORY, "response_error").with_extra(json!({ "error": error_text })),
                );
            }
        }
        Ok(())
    }

    /// Resend the latest user message. `Ok(false)` without one.
    ///
    /// # Errors
    ///
    /// As [`Self::send_message`].
    pub async fn regenerate(&mut self) -> Result<bool, ClientError> {
        let Some(text) = self.state.last_user_text().map(str::to_owned) else {
            return Ok(false);
        };
        self.emit("regenerate");
        self.send_message(&text).await?;
        Ok(true)
    }

    /// Raw text of an assistant message that offers the copy action.
    #[must_use]
    pub fn copy_text(&self, message_id: &str) -> Option<String> {
        let message = self.state.message(message_id)?;
        if message.role != Role::Assistant || !message.actions.contains(&MessageAction::Copy) {
            return None;
        }
        self.emit("copy");
        Some(message.text.clone())
    }

    /// The banner's clear-key action.
    ///
    /// # Errors
    ///
    /// Transport failures or an unconfirmed clear.
    pub async fn clear_key(&mut self) -> Result<(), ClientError> {
        match self.ctx.bounded(self.ctx.api.clear_key()).await {
            Ok(ack) if ack.success && ack.error.is_none() => {
                info!("chat: api key cleared");
                self.state.raise_banner(KEY_CLEARED_TEXT, Tone::Info, false, None);
                self.emit("api_key_cleared");
                Ok(())
            }
            Ok(ack) => {
                let message = ack.error.unwrap_or_else(|| "Failed to clear AI key".to_owned());
                warn!(%message, "chat: clear key refused");
                Err(TransportError::Application { status: 200, message }.into())
            }
            Err(e) => {
                warn!(error = %e, "chat: clear key failed");
                Err(e.into())
            }
        }
    }

    /// Clear key and session together. All-or-nothing: the conversation is
    /// wiped only when both calls confirm.
    pub async fn logout(&mut self) -> bool {
        let (key, session) = tokio::join!(
            self.ctx.bounded(self.ctx.api.clear_key()),
            self.ctx.bounded(self.ctx.api.clear_session()),
        );

        match (key, session) {
            (Ok(key), Ok(session)) if key.success && session.success => {
                self.state.clear_conversation();
                self.state.raise_banner(LOGOUT_DONE_TEXT, Tone::Success, false, None);
                self.emit("logout_success");
                info!("chat: logged out");
                true
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "chat: logout failed");
                self.state.raise_banner(LOGOUT_ERROR_TEXT, Tone::Danger, false, None);
                false
            }
            _ => {
                warn!("chat: logout not confirmed");
                self.state.raise_banner(LOGOUT_FAILED_TEXT, Tone::Danger, false, None);
                false
            }
        }
    }

    /// Applies to replies rendered from now on.
    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.state.render_mode = mode;
        self.state.clear_banner();
    }

    /// Settle a send whose future was dropped before it completed.
    pub fn abort_pending(&mut self) -> bool {
        let aborted = self.state.abort_pending();
        if aborted {
            self.emit("request_aborted");
        }
        aborted
    }
}

/// Text that replaces the placeholder when a chat request fails.
#[must_use]
pub fn chat_error_text(error: &TransportError) -> String {
    match error {
        TransportError::Network(_) | TransportError::Timeout(_) | TransportError::InvalidPayload(_) => {
            AI_UNAVAILABLE_TEXT.to_owned()
        }
        TransportError::Application { status, .. } => {
            server_text(error).map_or_else(|| format!("AI error ({status})"), str::to_owned)
        }
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
