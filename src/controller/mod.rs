//! Async controllers that drive the state modules over the network.
//!
//! SYSTEM CONTEXT
//! ==============
//! A controller owns one panel's state and a [`ClientContext`]. Each public
//! method runs a sans-IO `begin_*` transition, awaits the request under a
//! deadline, and feeds the outcome to the matching `complete_*` transition.
//! Errors are turned into state (notices, banners, placeholder text) and also
//! returned so callers such as the REPL can report them.

pub mod chat;
pub mod session;
pub mod workflow;

use std::future::Future;
use std::time::Duration;

use crate::background::Background;
use crate::net::api::BackendApi;
use crate::net::transport::TransportError;
use crate::telemetry::Telemetry;

/// Shared handles every controller needs.
#[derive(Clone)]
pub struct ClientContext {
    pub api: BackendApi,
    pub telemetry: Telemetry,
    pub background: Background,
    /// Upper bound on any single controller request.
    pub request_timeout: Duration,
}

impl ClientContext {
    #[must_use]
    pub fn new(api: BackendApi, telemetry: Telemetry, background: Background, request_timeout: Duration) -> Self {
        Self { api, telemetry, background, request_timeout }
    }

    /// Run `request` under the configured deadline.
    pub(crate) async fn bounded<T, F>(&self, request: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        with_timeout(self.request_timeout, request).await
    }
}

/// Settle `request` as [`TransportError::Timeout`] once `limit` elapses.
///
/// # Errors
///
/// The request's own error, or `Timeout(limit)`.
pub async fn with_timeout<T, F>(limit: Duration, request: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match tokio::time::timeout(limit, request).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(limit)),
    }
}

/// Server text from an application error, `None` for anything else or when
/// the server sent nothing useful.
pub(crate) fn server_text(error: &TransportError) -> Option<&str> {
    match error {
        TransportError::Application { status, message }
            if !message.trim().is_empty()
                && *message != crate::net::transport::request_failed_message(*status) =>
        {
            Some(message)
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
