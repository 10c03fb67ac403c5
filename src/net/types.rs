//! Wire schema for the helper backend endpoints.
//!
//! Every response struct defaults missing fields so a partially populated
//! body still decodes. Request structs serialize exactly the fields the
//! server reads.

use serde::{Deserialize, Serialize};

// =============================================================================
// TICKETS
// =============================================================================

/// The currently selected ticket as stored in the server session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedTicket {
    pub key: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub summary: String,
    /// Plain-text description (ADF flattened server-side).
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_html: Option<String>,
    #[serde(default, alias = "test_scenarios")]
    pub scenarios: Vec<String>,
    #[serde(default, alias = "test_cases")]
    pub generated_test_cases: Vec<String>,
}

/// Identity sent to `/select` when a row is chosen.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TicketRef {
    pub key: String,
    pub url: String,
    pub summary: String,
}

impl TicketRef {
    /// Fallback ticket when the server confirms without echoing `selected`.
    #[must_use]
    pub fn to_selected(&self) -> SelectedTicket {
        SelectedTicket {
            key: self.key.clone(),
            url: self.url.clone(),
            summary: self.summary.clone(),
            ..SelectedTicket::default()
        }
    }
}

/// One row of the search-result table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRow {
    pub key: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub issue_type: String,
    #[serde(default)]
    pub updated: Option<String>,
}

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ConnectRequest<'a> {
    pub jira_url: &'a str,
    pub email: &'a str,
    pub api_token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SetKeyRequest<'a> {
    pub api_key: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub description: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ManualPromptRequest<'a> {
    pub description: &'a str,
    pub prompt: &'a str,
}

#[derive(Debug, Serialize)]
pub struct StoreTestCasesRequest<'a> {
    pub test_cases: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct ConfirmUpdateRequest<'a> {
    pub updated_content: &'a str,
}

/// Telemetry event posted to `/log_event`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UiEvent {
    pub category: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl UiEvent {
    #[must_use]
    pub fn new(category: &str, event: &str) -> Self {
        Self { category: category.to_owned(), event: event.to_owned(), label: None, extra: None }
    }

    #[must_use]
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_owned());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = Some(extra);
        self
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Generic `{success, message?, error?}` acknowledgement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct JiraUser {
    #[serde(default, rename = "displayName")]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConnectResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<JiraUser>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SelectResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub selected: Option<SelectedTicket>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<TicketRow>,
    #[serde(default)]
    pub selected: Option<SelectedTicket>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct HasKeyResponse {
    #[serde(default)]
    pub has_key: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScenariosResponse {
    #[serde(default)]
    pub scenarios: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct StoreTestCasesResponse {
    #[serde(default)]
    pub stored_count: Option<usize>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdatePreviewResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub preview: bool,
    #[serde(default)]
    pub current_content: Option<String>,
    #[serde(default)]
    pub updated_content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
