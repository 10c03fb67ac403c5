//! Selected-ticket region and the generation/update workflow state.
//!
//! SYSTEM CONTEXT
//! ==============
//! The selected ticket is one shared value. Every mutation (select, refresh,
//! generate, manual prompt, deselect) goes through [`SelectionState::replace_ticket`],
//! which also re-derives the rendered [`SelectionView`]. Nothing else writes
//! `ticket` or `view`.
//!
//! DESIGN
//! ======
//! The workflow phase is derived, not stored: no ticket means
//! `NoneSelected`, an in-flight generation means `Generating`, anything else
//! is `Selected`. The ticket-update flow is a two-phase saga kept in
//! [`UpdateSaga`] so a confirm can never be sent without previewed content.

use super::{Notice, PendingRequest, RequestKind, Tone};
use crate::error::ValidationError;
use crate::net::types::{SelectedTicket, TicketRef};
use crate::util::render::{escape_html, html_to_text};
use crate::util::scenarios::{filter_preamble, numbered};

pub const NO_DESCRIPTION_TEXT: &str = "No description available";
pub const GENERATE_LABEL: &str = "Generate Test Scenarios";
pub const REGENERATE_LABEL: &str = "Regenerate Test Scenarios";

// =============================================================================
// VIEW
// =============================================================================

/// Rendered form of the selected ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketView {
    pub key: String,
    pub url: String,
    pub summary: String,
    /// Description region as HTML. Holds the placeholder when the ticket has none.
    pub description_html: String,
    pub scenarios: Vec<String>,
    /// Test cases numbered for display.
    pub test_cases: Vec<String>,
    pub generate_label: &'static str,
}

impl TicketView {
    /// Description text usable as generation input. The placeholder and
    /// whitespace-only content do not count.
    #[must_use]
    pub fn extract_description(&self) -> Option<String> {
        if self.description_html.contains(NO_DESCRIPTION_TEXT) {
            return None;
        }
        let text = html_to_text(&self.description_html);
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_owned())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SelectionView {
    #[default]
    Empty,
    /// Inert placeholder while `/select` is in flight.
    Loading { key: String },
    Ticket(TicketView),
    Error(String),
}

/// Pure render of the selected-ticket region.
#[must_use]
pub fn render_selection(ticket: Option<&SelectedTicket>) -> SelectionView {
    let Some(ticket) = ticket else {
        return SelectionView::Empty;
    };

    let description_html = match (&ticket.description_html, ticket.description.trim()) {
        (Some(html), _) if !html.trim().is_empty() => html.clone(),
        (_, text) if !text.is_empty() => escape_html(&ticket.description),
        _ => NO_DESCRIPTION_TEXT.to_owned(),
    };
    let scenarios = filter_preamble(&ticket.scenarios);
    let generate_label = if scenarios.is_empty() { GENERATE_LABEL } else { REGENERATE_LABEL };

    SelectionView::Ticket(TicketView {
        key: ticket.key.clone(),
        url: ticket.url.clone(),
        summary: ticket.summary.clone(),
        description_html,
        test_cases: numbered(&ticket.generated_test_cases),
        scenarios,
        generate_label,
    })
}

// =============================================================================
// UPDATE SAGA
// =============================================================================

/// Preview-then-confirm flow for writing scenarios back to the ticket.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum UpdateSaga {
    #[default]
    Idle,
    LoadingPreview,
    PreviewReady { current: String, updated: String },
    /// Preview was rejected; the next action retries the preview.
    PreviewFailed(String),
    Confirming { current: String, updated: String },
    Committed(String),
}

impl UpdateSaga {
    /// Content that a confirm would send, if a preview succeeded.
    #[must_use]
    pub fn previewed_content(&self) -> Option<&str> {
        match self {
            Self::PreviewReady { updated, .. } => Some(updated),
            _ => None,
        }
    }
}

// =============================================================================
// WORKFLOW STATE
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowPhase {
    NoneSelected,
    Selected,
    Generating,
}

#[derive(Clone, Debug, Default)]
pub struct SelectionState {
    pub ticket: Option<SelectedTicket>,
    pub view: SelectionView,
    pub pending: Option<PendingRequest>,
    /// Inline message next to the generate/update controls.
    pub notice: Option<Notice>,
    pub update: UpdateSaga,
}

impl SelectionState {
    #[must_use]
    pub fn phase(&self) -> WorkflowPhase {
        match (&self.ticket, self.pending) {
            (None, _) => WorkflowPhase::NoneSelected,
            (Some(_), Some(p)) if p.kind.is_generation() => WorkflowPhase::Generating,
            (Some(_), _) => WorkflowPhase::Selected,
        }
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Claim the in-flight slot. Refused (false) while another request runs.
    pub fn begin(&mut self, kind: RequestKind) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(PendingRequest::start(kind));
        true
    }

    pub fn finish(&mut self) {
        self.pending = None;
    }

    /// Release a stuck request. A pending select falls back to the last
    /// rendered ticket; a pending preview or confirm returns the saga to a
    /// retryable state.
    pub fn abort_pending(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        match pending.kind {
            RequestKind::Select => self.view = render_selection(self.ticket.as_ref()),
            RequestKind::Preview => self.update = UpdateSaga::PreviewFailed("Request cancelled.".to_owned()),
            RequestKind::Confirm => self.restore_preview(),
            _ => {}
        }
        true
    }

    /// The only writer of `ticket` and `view`.
    pub fn replace_ticket(&mut self, ticket: Option<SelectedTicket>) {
        let same_ticket = match (&self.ticket, &ticket) {
            (Some(old), Some(new)) => old.key == new.key,
            _ => false,
        };
        if !same_ticket {
            self.update = UpdateSaga::Idle;
            self.notice = None;
        }
        self.ticket = ticket;
        self.view = render_selection(self.ticket.as_ref());
    }

    pub fn set_notice(&mut self, tone: Tone, text: impl Into<String>) {
        self.notice = Some(Notice::new(tone, text));
    }

    // -------------------------------------------------------------------------
    // select / deselect
    // -------------------------------------------------------------------------

    pub fn begin_select(&mut self, ticket: &TicketRef) -> bool {
        if !self.begin(RequestKind::Select) {
            return false;
        }
        self.notice = None;
        self.view = SelectionView::Loading { key: ticket.key.clone() };
        true
    }

    pub fn complete_select(&mut self, result: Result<SelectedTicket, String>) {
        self.finish();
        match result {
            Ok(ticket) => self.replace_ticket(Some(ticket)),
            Err(message) => {
                self.replace_ticket(None);
                self.view = SelectionView::Error(message);
            }
        }
    }

    pub fn begin_deselect(&mut self) -> bool {
        self.begin(RequestKind::Deselect)
    }

    /// Resets the region whatever the server said.
    pub fn complete_deselect(&mut self) {
        self.finish();
        self.replace_ticket(None);
    }

    // -------------------------------------------------------------------------
    // generation
    // -------------------------------------------------------------------------

    /// Description to send for generation, read from the rendered view.
    ///
    /// # Errors
    ///
    /// `NoTicketSelected` without a rendered ticket, `MissingDescription`
    /// when the region holds no usable text.
    pub fn generation_input(&self) -> Result<String, ValidationError> {
        let SelectionView::Ticket(view) = &self.view else {
            return Err(ValidationError::NoTicketSelected);
        };
        view.extract_description().ok_or(ValidationError::MissingDescription)
    }

    /// Write a generated scenario set into the shared ticket. Preamble lines
    /// are dropped and the list is mirrored into the test cases. Returns the
    /// stored list for persistence.
    pub fn apply_scenarios(&mut self, scenarios: &[String]) -> Vec<String> {
        let filtered = filter_preamble(scenarios);
        if let Some(mut ticket) = self.ticket.clone() {
            ticket.scenarios.clone_from(&filtered);
            ticket.generated_test_cases.clone_from(&filtered);
            self.replace_ticket(Some(ticket));
        }
        filtered
    }

    // -------------------------------------------------------------------------
    // update saga
    // -------------------------------------------------------------------------

    pub fn begin_preview(&mut self) -> bool {
        if !self.begin(RequestKind::Preview) {
            return false;
        }
        self.notice = None;
        self.update = UpdateSaga::LoadingPreview;
        true
    }

    /// `Ok((current, updated))` moves to `PreviewReady`, `Err` to `PreviewFailed`.
    pub fn complete_preview(&mut self, result: Result<(String, String), String>) {
        self.finish();
        self.update = match result {
            Ok((current, updated)) => UpdateSaga::PreviewReady { current, updated },
            Err(reason) => UpdateSaga::PreviewFailed(reason),
        };
    }

    /// Replace the previewed content with the user's edit. The next confirm
    /// sends the edited text.
    ///
    /// # Errors
    ///
    /// `EmptyTestPlan` for blank text, `NoPreviewToEdit` outside `PreviewReady`.
    pub fn edit_preview(&mut self, text: &str) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyTestPlan);
        }
        let UpdateSaga::PreviewReady { updated, .. } = &mut self.update else {
            return Err(ValidationError::NoPreviewToEdit);
        };
        *updated = text.to_owned();
        self.notice = None;
        Ok(())
    }

    /// Returns the content to commit, or `None` when no preview is ready or
    /// the slot is taken.
    pub fn begin_confirm(&mut self) -> Option<String> {
        let UpdateSaga::PreviewReady { current, updated } = &self.update else {
            return None;
        };
        let (current, updated) = (current.clone(), updated.clone());
        if !self.begin(RequestKind::Confirm) {
            return None;
        }
        self.notice = None;
        self.update = UpdateSaga::Confirming { current, updated: updated.clone() };
        Some(updated)
    }

    /// Success commits; failure returns to the preview with an inline error.
    pub fn complete_confirm(&mut self, result: Result<String, String>) {
        self.finish();
        match result {
            Ok(message) => self.update = UpdateSaga::Committed(message),
            Err(error) => {
                self.restore_preview();
                self.set_notice(Tone::Danger, error);
            }
        }
    }

    pub fn cancel_update(&mut self) {
        if matches!(self.pending, Some(p) if matches!(p.kind, RequestKind::Preview | RequestKind::Confirm)) {
            self.finish();
        }
        self.update = UpdateSaga::Idle;
    }

    fn restore_preview(&mut self) {
        if let UpdateSaga::Confirming { current, updated } = std::mem::take(&mut self.update) {
            self.update = UpdateSaga::PreviewReady { current, updated };
        }
    }
}

#[cfg(test)]
#[path = "selection_test.rs"]
mod tests;
