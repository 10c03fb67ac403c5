//! Ticket selection, scenario generation and ticket update.
//!
//! SYSTEM CONTEXT
//! ==============
//! Owns the selected-ticket region ([`SelectionState`]) and the result table
//! ([`ResultsTable`]). They keep separate in-flight slots, so a refresh can
//! run while scenarios are generating.
//!
//! Generation checks its preconditions before any generation request: the
//! server must report an AI key (asked fresh each time) and the rendered
//! ticket must carry a usable description. Results are filtered, written into
//! the shared ticket, and persisted by a detached `/api/store_test_cases`
//! call that never rolls anything back.

use serde_json::json;
use tracing::{info, warn};

use super::{ClientContext, server_text};
use crate::error::{ClientError, ValidationError};
use crate::net::transport::TransportError;
use crate::net::types::{ScenariosResponse, TicketRef, UiEvent};
use crate::state::results::{ResultsTable, SortColumn};
use crate::state::selection::{SelectionState, UpdateSaga};
use crate::state::{RequestKind, Tone};

pub const AI_UNAVAILABLE_TEXT: &str = "AI service is currently unavailable. Please try again later.";
pub const AI_KEY_INVALID_TEXT: &str = "AI API key missing or invalid. Please check your API key.";
pub const GENERATE_FAILED_TEXT: &str = "Failed to generate test scenarios.";
pub const MANUAL_PROMPT_FAILED_TEXT: &str = "Failed to generate scenarios.";
pub const BAD_REQUEST_TEXT: &str = "Bad request. Please check your input.";
pub const PREVIEW_FAILED_TEXT: &str = "Failed to prepare ticket update. Please try again.";
pub const PREVIEW_NETWORK_TEXT: &str = "Network error occurred while loading preview. Please try again.";
pub const CONFIRM_FAILED_TEXT: &str = "Failed to update Test Plan.";
pub const CONFIRM_DONE_TEXT: &str = "Test Plan updated successfully!";

const CATEGORY: &str = "workflow";
const STORE_TEST_CASES_LABEL: &str = "store_test_cases";
const CLEAR_SELECTED_LABEL: &str = "clear_selected";

pub struct SelectionWorkflow {
    ctx: ClientContext,
    selection: SelectionState,
    table: ResultsTable,
}

impl SelectionWorkflow {
    #[must_use]
    pub fn new(ctx: ClientContext) -> Self {
        Self { ctx, selection: SelectionState::default(), table: ResultsTable::default() }
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    #[must_use]
    pub fn table(&self) -> &ResultsTable {
        &self.table
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Select a row. The region shows a loading placeholder until the server
    /// returns its canonical copy of the ticket.
    ///
    /// # Errors
    ///
    /// `RequestInFlight` when the region is busy, otherwise transport failures
    /// (also shown as the region's error view).
    pub async fn select(&mut self, ticket: &TicketRef) -> Result<(), ClientError> {
        if !self.selection.begin_select(ticket) {
            return Err(ValidationError::RequestInFlight.into());
        }

        match self.ctx.bounded(self.ctx.api.select(ticket)).await {
            Ok(response) => {
                let selected = response.selected.unwrap_or_else(|| ticket.to_selected());
                info!(key = %selected.key, "workflow: ticket selected");
                self.table.selected_key = Some(selected.key.clone());
                self.selection.complete_select(Ok(selected));
                Ok(())
            }
            Err(e) => {
                warn!(key = %ticket.key, error = %e, "workflow: select failed");
                self.selection.complete_select(Err(request_error_text(&e)));
                Err(e.into())
            }
        }
    }

    /// Select a row of the current results by key.
    ///
    /// # Errors
    ///
    /// `NotInResults` for a key the table does not hold, otherwise as
    /// [`Self::select`].
    pub async fn select_row(&mut self, key: &str) -> Result<(), ClientError> {
        let Some(row) = self.table.row(key) else {
            return Err(ValidationError::NotInResults.into());
        };
        let ticket = TicketRef { key: row.key.clone(), url: row.url.clone(), summary: row.summary.clone() };
        self.select(&ticket).await
    }

    /// Clear the selection. The region resets once the call settles whatever
    /// its outcome. Returns false when refused.
    pub async fn deselect(&mut self) -> bool {
        if !self.selection.begin_deselect() {
            return false;
        }
        match self.ctx.bounded(self.ctx.api.clear_selected()).await {
            Ok(_) => info!("workflow: ticket deselected"),
            Err(e) => warn!(error = %e, "workflow: clear_selected failed, resetting anyway"),
        }
        self.selection.complete_deselect();
        self.table.selected_key = None;
        true
    }

    /// A new search is starting: the region resets at once and the server
    /// selection is cleared in the background.
    pub fn new_search(&mut self) {
        self.selection.replace_ticket(None);
        self.table.selected_key = None;
        self.ctx.telemetry.emit(UiEvent::new(CATEGORY, "new_search"));

        let api = self.ctx.api.clone();
        self.ctx.background.spawn(CLEAR_SELECTED_LABEL, async move {
            api.clear_selected().await?;
            Ok(())
        });
    }

    // =========================================================================
    // GENERATION
    // =========================================================================

    /// Generate (or regenerate) scenarios from the ticket description.
    ///
    /// # Errors
    ///
    /// Validation errors for a busy region, a missing key or a missing
    /// description (no generation call made), otherwise transport failures.
    /// Every failure is also shown as the inline notice.
    pub async fn generate(&mut self) -> Result<(), ClientError> {
        let has_scenarios = self.selection.ticket.as_ref().is_some_and(|t| !t.scenarios.is_empty());
        let kind = if has_scenarios { RequestKind::Regenerate } else { RequestKind::Generate };
        let description = self.claim_generation(kind).await?;

        self.ctx.telemetry.emit(UiEvent::new(CATEGORY, "generate_scenarios").with_label(kind_label(kind)));
        let result = self.ctx.bounded(self.ctx.api.generate_scenarios(&description)).await;
        self.finish_generation(result, GENERATE_FAILED_TEXT)
    }

    /// Generate scenarios with a custom instruction. Results replace the
    /// ticket's list.
    ///
    /// # Errors
    ///
    /// As [`Self::generate`], plus `EmptyPrompt` for a blank instruction.
    pub async fn manual_prompt(&mut self, instruction: &str) -> Result<(), ClientError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(ValidationError::EmptyPrompt.into());
        }
        let description = self.claim_generation(RequestKind::ManualPrompt).await?;

        self.ctx.telemetry.emit(
            UiEvent::new(CATEGORY, "manual_prompt").with_extra(json!({ "length": instruction.chars().count() })),
        );
        let result = self
            .ctx
            .bounded(self.ctx.api.manual_prompt_scenarios(&description, instruction))
            .await;
        self.finish_generation(result, MANUAL_PROMPT_FAILED_TEXT)
    }

    /// Take the slot and check the preconditions. On any failure the slot is
    /// released and the notice says why.
    async fn claim_generation(&mut self, kind: RequestKind) -> Result<String, ClientError> {
        if self.selection.ticket.is_none() {
            return Err(self.refuse(ValidationError::NoTicketSelected));
        }
        if !self.selection.begin(kind) {
            return Err(ValidationError::RequestInFlight.into());
        }
        self.selection.notice = None;

        match self.ctx.bounded(self.ctx.api.has_key()).await {
            Ok(true) => {}
            Ok(false) => {
                self.selection.finish();
                self.ctx.telemetry.emit(UiEvent::new(CATEGORY, "api_key_missing"));
                return Err(self.refuse(ValidationError::MissingApiKey));
            }
            Err(e) => {
                self.selection.finish();
                warn!(error = %e, "workflow: key check failed");
                self.selection.set_notice(Tone::Warning, ValidationError::MissingApiKey.to_string());
                return Err(e.into());
            }
        }

        match self.selection.generation_input() {
            Ok(description) => Ok(description),
            Err(e) => {
                self.selection.finish();
                Err(self.refuse(e))
            }
        }
    }

    fn refuse(&mut self, error: ValidationError) -> ClientError {
        self.selection.set_notice(Tone::Warning, error.to_string());
        error.into()
    }

    fn finish_generation(
        &mut self,
        result: Result<ScenariosResponse, TransportError>,
        fallback: &'static str,
    ) -> Result<(), ClientError> {
        let kind = self.selection.pending.map(|p| p.kind);
        self.selection.finish();

        let scenarios = match result {
            Ok(ScenariosResponse { scenarios: Some(scenarios), .. }) => scenarios,
            Ok(ScenariosResponse { error, .. }) => {
                let message = error.filter(|e| !e.trim().is_empty()).unwrap_or_else(|| fallback.to_owned());
                self.selection.set_notice(Tone::Danger, message.clone());
                return Err(TransportError::Application { status: 200, message }.into());
            }
            Err(e) => {
                warn!(error = %e, "workflow: generation failed");
                let manual = kind == Some(RequestKind::ManualPrompt);
                self.selection.set_notice(Tone::Danger, generation_error_text(&e, fallback, manual));
                return Err(e.into());
            }
        };

        let stored = self.selection.apply_scenarios(&scenarios);
        info!(count = stored.len(), "workflow: scenarios generated");
        self.persist_test_cases(stored);
        Ok(())
    }

    fn persist_test_cases(&self, test_cases: Vec<String>) {
        let api = self.ctx.api.clone();
        self.ctx.background.spawn(STORE_TEST_CASES_LABEL, async move {
            let response = api.store_test_cases(&test_cases).await?;
            info!(stored = response.stored_count.unwrap_or(test_cases.len()), "workflow: test cases stored");
            Ok(())
        });
    }

    // =========================================================================
    // TICKET UPDATE
    // =========================================================================

    /// Ask the server for a preview of the updated ticket content.
    ///
    /// # Errors
    ///
    /// `RequestInFlight` when busy, otherwise the preview failure. A failed
    /// preview leaves the saga in `PreviewFailed`, ready to retry.
    pub async fn load_preview(&mut self) -> Result<(), ClientError> {
        if self.selection.ticket.is_none() {
            return Err(self.refuse(ValidationError::NoTicketSelected));
        }
        if !self.selection.begin_preview() {
            return Err(ValidationError::RequestInFlight.into());
        }

        match self.ctx.bounded(self.ctx.api.update_preview()).await {
            Ok(response) => match response.updated_content {
                Some(updated) if response.success && response.preview && !updated.trim().is_empty() => {
                    self.selection
                        .complete_preview(Ok((response.current_content.unwrap_or_default(), updated)));
                    Ok(())
                }
                _ => {
                    let message = response.error.unwrap_or_else(|| PREVIEW_FAILED_TEXT.to_owned());
                    self.selection.complete_preview(Err(message.clone()));
                    Err(TransportError::Application { status: 200, message }.into())
                }
            },
            Err(e) => {
                warn!(error = %e, "workflow: preview failed");
                let message = if e.is_network() {
                    PREVIEW_NETWORK_TEXT.to_owned()
                } else {
                    server_text(&e).unwrap_or(PREVIEW_FAILED_TEXT).to_owned()
                };
                self.selection.complete_preview(Err(message));
                Err(e.into())
            }
        }
    }

    /// Commit the previewed content. Without a ready preview this loads one
    /// instead and sends nothing.
    ///
    /// # Errors
    ///
    /// Preview errors (see [`Self::load_preview`]), `RequestInFlight`, or the
    /// commit failure, which returns the saga to `PreviewReady`.
    pub async fn confirm_update(&mut self) -> Result<(), ClientError> {
        if self.selection.update.previewed_content().is_none() {
            return self.load_preview().await;
        }
        let Some(updated) = self.selection.begin_confirm() else {
            return Err(ValidationError::RequestInFlight.into());
        };

        match self.ctx.bounded(self.ctx.api.confirm_update(&updated)).await {
            Ok(ack) if ack.success => {
                let message = ack.message.unwrap_or_else(|| CONFIRM_DONE_TEXT.to_owned());
                info!("workflow: ticket updated");
                self.selection.complete_confirm(Ok(message));
                self.ctx.telemetry.emit(UiEvent::new(CATEGORY, "ticket_updated"));
                self.refresh().await;
                Ok(())
            }
            Ok(ack) => {
                let message = ack.error.unwrap_or_else(|| CONFIRM_FAILED_TEXT.to_owned());
                self.selection.complete_confirm(Err(message.clone()));
                Err(TransportError::Application { status: 200, message }.into())
            }
            Err(e) => {
                warn!(error = %e, "workflow: confirm failed");
                let message = if e.is_network() {
                    format!("Network error: {e}")
                } else {
                    server_text(&e).unwrap_or(CONFIRM_FAILED_TEXT).to_owned()
                };
                self.selection.complete_confirm(Err(message));
                Err(e.into())
            }
        }
    }

    /// Replace the previewed content before confirming.
    ///
    /// # Errors
    ///
    /// `EmptyTestPlan` or `NoPreviewToEdit`; the preview is left as it was.
    pub fn edit_preview(&mut self, text: &str) -> Result<(), ClientError> {
        self.selection.edit_preview(text)?;
        self.ctx.telemetry.emit(
            UiEvent::new(CATEGORY, "edit_test_plan").with_extra(json!({ "length": text.chars().count() })),
        );
        Ok(())
    }

    pub fn cancel_update(&mut self) {
        self.selection.cancel_update();
    }

    #[must_use]
    pub fn update_state(&self) -> &UpdateSaga {
        &self.selection.update
    }

    // =========================================================================
    // TABLE
    // =========================================================================

    /// Re-fetch rows and selection. Failures are logged and leave everything
    /// as it was. Returns whether new data was applied.
    pub async fn refresh(&mut self) -> bool {
        if !self.table.begin_refresh() {
            return false;
        }
        let result = self.ctx.bounded(self.ctx.api.refresh()).await;
        self.table.finish_refresh();

        match result {
            Ok(response) if response.success => {
                self.table.selected_key = response.selected.as_ref().map(|t| t.key.clone());
                self.table.replace_rows(response.results);
                self.selection.replace_ticket(response.selected);
                info!(rows = self.table.rows.len(), "workflow: refreshed");
                true
            }
            Ok(response) => {
                warn!(message = ?response.message, "workflow: refresh not successful");
                false
            }
            Err(e) => {
                warn!(error = %e, "workflow: refresh failed");
                false
            }
        }
    }

    pub fn sort_by(&mut self, column: SortColumn) {
        self.table.toggle_sort(column);
        self.ctx.telemetry.emit(UiEvent::new("ui", "table_sort").with_label(&column.to_string()));
    }

    /// Release the selection slot after its future was dropped.
    pub fn abort_pending(&mut self) -> bool {
        self.selection.abort_pending()
    }
}

fn kind_label(kind: RequestKind) -> &'static str {
    if kind == RequestKind::Regenerate { "regenerate" } else { "generate" }
}

/// Inline text for a failed generation request.
#[must_use]
pub fn generation_error_text(error: &TransportError, fallback: &str, manual_prompt: bool) -> String {
    match error.status() {
        Some(503) => AI_UNAVAILABLE_TEXT.to_owned(),
        Some(403) => AI_KEY_INVALID_TEXT.to_owned(),
        Some(400) if manual_prompt => server_text(error).unwrap_or(BAD_REQUEST_TEXT).to_owned(),
        Some(_) => server_text(error).unwrap_or(fallback).to_owned(),
        None => request_error_text(error),
    }
}

/// Region text for a request that failed outright.
fn request_error_text(error: &TransportError) -> String {
    match error {
        TransportError::Application { status, .. } => {
            server_text(error).map_or_else(|| format!("Request failed ({status})"), str::to_owned)
        }
        other => format!("Network error: {other}"),
    }
}

#[cfg(test)]
#[path = "workflow_test.rs"]
mod tests;
