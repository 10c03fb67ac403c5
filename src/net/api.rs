//! Typed endpoint helpers over [`Transport`].
//!
//! SYSTEM CONTEXT
//! ==============
//! One function per backend endpoint. Each builds the request body, calls the
//! transport, and decodes the tolerant JSON into a `types` struct. Branching on
//! `success`/`has_key`/`scenarios` stays with the controllers, which know what
//! the UI should do with each shape.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::transport::{Transport, TransportError};
use super::types::{
    Ack, ChatRequest, ChatResponse, ConfirmUpdateRequest, ConnectRequest, ConnectResponse, GenerateRequest,
    HasKeyResponse, ManualPromptRequest, RefreshResponse, ScenariosResponse, SelectResponse, SetKeyRequest,
    StoreTestCasesRequest, StoreTestCasesResponse, TicketRef, UiEvent, UpdatePreviewResponse,
};

pub const CONNECT: &str = "/connect";
pub const SELECT: &str = "/select";
pub const CLEAR_SELECTED: &str = "/clear_selected";
pub const REFRESH: &str = "/refresh";
pub const AI_HAS_KEY: &str = "/api/ai/has_key";
pub const AI_SET_KEY: &str = "/api/ai/set_key";
pub const AI_CLEAR_KEY: &str = "/api/ai/clear_key";
pub const AI_CLEAR_SESSION: &str = "/api/ai/clear_session";
pub const AI_CHAT: &str = "/api/ai/chat";
pub const GENERATE_SCENARIOS: &str = "/api/generate_test_scenarios";
pub const MANUAL_PROMPT_SCENARIOS: &str = "/api/manual_prompt_scenarios";
pub const STORE_TEST_CASES: &str = "/api/store_test_cases";
pub const UPDATE_PREVIEW: &str = "/api/update_ticket_with_scenarios";
pub const CONFIRM_UPDATE: &str = "/api/confirm_update_ticket_with_scenarios";
pub const LOG_EVENT: &str = "/log_event";

/// Cheaply cloneable handle to the backend.
#[derive(Clone)]
pub struct BackendApi {
    transport: Arc<dyn Transport>,
}

impl BackendApi {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(&self, path: &str, body: Option<&B>) -> Result<R, TransportError> {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| TransportError::InvalidPayload(e.to_string()))?;
        let value = self.transport.call(Method::POST, path, body).await?;
        decode(path, value)
    }

    async fn post_empty<R: DeserializeOwned>(&self, path: &str) -> Result<R, TransportError> {
        self.post::<Value, R>(path, None).await
    }

    /// `POST /connect`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn connect(&self, jira_url: &str, email: &str, api_token: &str) -> Result<ConnectResponse, TransportError> {
        self.post(CONNECT, Some(&ConnectRequest { jira_url, email, api_token })).await
    }

    /// `POST /select` with the chosen row's identity.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn select(&self, ticket: &TicketRef) -> Result<SelectResponse, TransportError> {
        self.post(SELECT, Some(ticket)).await
    }

    /// `POST /clear_selected`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn clear_selected(&self) -> Result<Ack, TransportError> {
        self.post_empty(CLEAR_SELECTED).await
    }

    /// `POST /refresh`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn refresh(&self) -> Result<RefreshResponse, TransportError> {
        self.post_empty(REFRESH).await
    }

    /// `GET /api/ai/has_key`. Always a fresh query.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn has_key(&self) -> Result<bool, TransportError> {
        let value = self.transport.call(Method::GET, AI_HAS_KEY, None).await?;
        let body: HasKeyResponse = decode(AI_HAS_KEY, value)?;
        Ok(body.has_key)
    }

    /// `POST /api/ai/set_key`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn set_key(&self, api_key: &str) -> Result<Ack, TransportError> {
        self.post(AI_SET_KEY, Some(&SetKeyRequest { api_key })).await
    }

    /// `POST /api/ai/clear_key`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn clear_key(&self) -> Result<Ack, TransportError> {
        self.post_empty(AI_CLEAR_KEY).await
    }

    /// `POST /api/ai/clear_session`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn clear_session(&self) -> Result<Ack, TransportError> {
        self.post_empty(AI_CLEAR_SESSION).await
    }

    /// `POST /api/ai/chat`. A 2xx body that still carries `error` is treated
    /// as an application error.
    ///
    /// # Errors
    ///
    /// Propagates transport failures, non-2xx statuses, and in-band errors.
    pub async fn chat(&self, message: &str) -> Result<String, TransportError> {
        let body: ChatResponse = self.post(AI_CHAT, Some(&ChatRequest { message })).await?;
        if let Some(error) = body.error.filter(|e| !e.trim().is_empty()) {
            return Err(TransportError::Application { status: 200, message: error });
        }
        Ok(body.response.unwrap_or_default())
    }

    /// `POST /api/generate_test_scenarios`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn generate_scenarios(&self, description: &str) -> Result<ScenariosResponse, TransportError> {
        self.post(GENERATE_SCENARIOS, Some(&GenerateRequest { description })).await
    }

    /// `POST /api/manual_prompt_scenarios`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn manual_prompt_scenarios(&self, description: &str, prompt: &str) -> Result<ScenariosResponse, TransportError> {
        self.post(MANUAL_PROMPT_SCENARIOS, Some(&ManualPromptRequest { description, prompt }))
            .await
    }

    /// `POST /api/store_test_cases`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn store_test_cases(&self, test_cases: &[String]) -> Result<StoreTestCasesResponse, TransportError> {
        self.post(STORE_TEST_CASES, Some(&StoreTestCasesRequest { test_cases })).await
    }

    /// `POST /api/update_ticket_with_scenarios`: compute a preview, no write.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn update_preview(&self) -> Result<UpdatePreviewResponse, TransportError> {
        self.post_empty(UPDATE_PREVIEW).await
    }

    /// `POST /api/confirm_update_ticket_with_scenarios`: commit previewed content.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn confirm_update(&self, updated_content: &str) -> Result<Ack, TransportError> {
        self.post(CONFIRM_UPDATE, Some(&ConfirmUpdateRequest { updated_content })).await
    }

    /// `POST /log_event`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-2xx statuses.
    pub async fn log_event(&self, event: &UiEvent) -> Result<Ack, TransportError> {
        self.post(LOG_EVENT, Some(event)).await
    }
}

fn decode<R: DeserializeOwned>(path: &str, value: Value) -> Result<R, TransportError> {
    serde_json::from_value(value).map_err(|e| TransportError::InvalidPayload(format!("{path}: {e}")))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
