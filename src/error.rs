//! Client error taxonomy.
//!
//! DESIGN
//! ======
//! `Transport` errors come back from the network; `Validation` errors are
//! raised before a request is built and never reach the network. Controllers
//! use [`ErrorClass`] to pick user messaging: transient classes suggest a
//! retry, credential problems also offer key remediation.

use crate::net::transport::TransportError;

/// Client-side precondition failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a message.")]
    EmptyMessage,
    #[error("Please enter a custom prompt.")]
    EmptyPrompt,
    #[error("API key is required.")]
    EmptyApiKey,
    #[error("No description available to generate test scenarios.")]
    MissingDescription,
    #[error("AI API key missing. Please set your API key first.")]
    MissingApiKey,
    #[error("No ticket selected.")]
    NoTicketSelected,
    #[error("All fields are required.")]
    MissingConnectFields,
    #[error("Another request is still in progress.")]
    RequestInFlight,
    #[error("Test plan content cannot be empty.")]
    EmptyTestPlan,
    #[error("No preview to edit. Load the preview first.")]
    NoPreviewToEdit,
    #[error("Ticket is not in the current results.")]
    NotInResults,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Coarse buckets that drive what the UI says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Could not reach the server or it never answered.
    Network,
    /// Upstream AI service unavailable (HTTP 503).
    Unavailable,
    /// Key missing/invalid or not authorized (HTTP 401/403).
    Credential,
    /// Any other server-reported failure.
    Application,
    /// Client-side precondition failure.
    Validation,
}

impl ErrorClass {
    /// Worth suggesting "try again".
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Network | Self::Unavailable)
    }
}

impl ClientError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::Validation,
            Self::Transport(e) if e.is_network() => ErrorClass::Network,
            Self::Transport(e) => match e.status() {
                Some(503) => ErrorClass::Unavailable,
                Some(401 | 403) => ErrorClass::Credential,
                _ => ErrorClass::Application,
            },
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status(),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
