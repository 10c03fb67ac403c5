//! AI chat panel state.
//!
//! SYSTEM CONTEXT
//! ==============
//! Holds the conversation, the single in-flight slot, the status banner and
//! the active render mode. `begin_send` performs the optimistic update (user
//! message + loading placeholder); `complete_success`/`complete_error` merge
//! the server result into the placeholder and return the panel to idle.

use super::{PendingRequest, RequestKind, Tone};
use crate::error::ValidationError;
use crate::util::render::{RenderMode, escape_html, render_assistant};

/// Text shown in the assistant bubble while a reply is pending.
pub const PLACEHOLDER_TEXT: &str = "…";
/// Error text the backend uses for a rejected AI key.
pub const INVALID_API_KEY_MESSAGE: &str = "Invalid API Key or unauthorized";
pub const INVALID_API_KEY_BANNER: &str = "Invalid API Key. Please update your key or clear it.";
pub const CANCELLED_TEXT: &str = "Request cancelled.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Per-message affordances attached to completed assistant replies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageAction {
    Copy,
    Regenerate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    /// Raw text as typed or as returned by the server.
    pub text: String,
    /// HTML fragment derived from `text` at render time.
    pub rendered: String,
    pub loading: bool,
    pub actions: Vec<MessageAction>,
}

impl Message {
    fn user(text: &str) -> Self {
        Self {
            id: new_message_id(),
            role: Role::User,
            text: text.to_owned(),
            rendered: escape_html(text),
            loading: false,
            actions: Vec::new(),
        }
    }

    fn placeholder() -> Self {
        Self {
            id: new_message_id(),
            role: Role::Assistant,
            text: PLACEHOLDER_TEXT.to_owned(),
            rendered: PLACEHOLDER_TEXT.to_owned(),
            loading: true,
            actions: Vec::new(),
        }
    }
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChatPhase {
    #[default]
    Idle,
    AwaitingResponse(PendingRequest),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BannerAction {
    ClearKey,
}

/// Status line at the top of the panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusBanner {
    pub text: String,
    pub tone: Tone,
    /// Sticky banners stay until explicitly cleared.
    pub sticky: bool,
    pub action: Option<BannerAction>,
}

#[derive(Clone, Debug, Default)]
pub struct ChatState {
    pub messages: Vec<Message>,
    pub phase: ChatPhase,
    pub banner: Option<StatusBanner>,
    pub panel_open: bool,
    pub render_mode: RenderMode,
    placeholder_id: Option<String>,
}

impl ChatState {
    #[must_use]
    pub fn new(render_mode: RenderMode) -> Self {
        Self { render_mode, ..Self::default() }
    }

    #[must_use]
    pub fn send_enabled(&self) -> bool {
        self.phase == ChatPhase::Idle
    }

    #[must_use]
    pub fn is_awaiting(&self) -> bool {
        matches!(self.phase, ChatPhase::AwaitingResponse(_))
    }

    /// Optimistic update for a send. Returns the trimmed text to post.
    ///
    /// # Errors
    ///
    /// `EmptyMessage` or `RequestInFlight`; state is left untouched.
    pub fn begin_send(&mut self, text: &str) -> Result<String, ValidationError> {
        let message = text.trim();
        if message.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        if self.is_awaiting() {
            return Err(ValidationError::RequestInFlight);
        }
        self.dismiss_transient_banner();
        self.messages.push(Message::user(message));
        let placeholder = Message::placeholder();
        self.placeholder_id = Some(placeholder.id.clone());
        self.messages.push(placeholder);
        self.phase = ChatPhase::AwaitingResponse(PendingRequest::start(RequestKind::Chat));
        Ok(message.to_owned())
    }

    /// Replace the placeholder with the reply, rendered in the current mode,
    /// and attach copy/regenerate actions.
    pub fn complete_success(&mut self, reply: &str) {
        let rendered = render_assistant(reply, self.render_mode);
        let message = self.settle_placeholder();
        message.text = reply.to_owned();
        message.rendered = rendered;
        message.actions = vec![MessageAction::Copy, MessageAction::Regenerate];
    }

    /// Replace the placeholder with error text. No actions are attached.
    pub fn complete_error(&mut self, error_text: &str) {
        let message = self.settle_placeholder();
        message.text = error_text.to_owned();
        message.rendered = escape_html(error_text);
        message.actions.clear();
    }

    /// Drop a stuck request: the placeholder says it was cancelled and the
    /// panel accepts input again. Returns false when nothing was pending.
    pub fn abort_pending(&mut self) -> bool {
        if !self.is_awaiting() {
            return false;
        }
        self.complete_error(CANCELLED_TEXT);
        true
    }

    fn settle_placeholder(&mut self) -> &mut Message {
        self.phase = ChatPhase::Idle;
        let id = self.placeholder_id.take();
        let index = id
            .and_then(|id| self.messages.iter().position(|m| m.id == id))
            .unwrap_or_else(|| {
                self.messages.push(Message::placeholder());
                self.messages.len() - 1
            });
        let message = &mut self.messages[index];
        message.loading = false;
        message
    }

    /// Most recent user text, by reverse scan of the history.
    #[must_use]
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.text.as_str())
    }

    #[must_use]
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn raise_banner(&mut self, text: &str, tone: Tone, sticky: bool, action: Option<BannerAction>) {
        self.banner = Some(StatusBanner { text: text.to_owned(), tone, sticky, action });
    }

    pub fn clear_banner(&mut self) {
        self.banner = None;
    }

    /// Clears a non-sticky banner; sticky ones survive until `clear_banner`.
    pub fn dismiss_transient_banner(&mut self) {
        if self.banner.as_ref().is_some_and(|b| !b.sticky) {
            self.banner = None;
        }
    }

    /// Wipe the conversation after a successful logout.
    pub fn clear_conversation(&mut self) {
        self.messages.clear();
        self.placeholder_id = None;
        self.phase = ChatPhase::Idle;
        self.banner = None;
        self.panel_open = false;
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
