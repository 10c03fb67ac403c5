//! Best-effort UI event telemetry.
//!
//! SYSTEM CONTEXT
//! ==============
//! Controllers call [`Telemetry::emit`] at interesting moments (message sent,
//! response rendered, key missing). Events go onto a bounded "beacon" queue
//! drained by a worker task; when the queue is full or absent each event is
//! posted by its own detached request instead. Nothing here returns an error
//! or blocks the caller.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::background::Background;
use crate::error::ClientError;
use crate::net::api::BackendApi;
use crate::net::types::UiEvent;

const LOG_EVENT_LABEL: &str = "log_event";

#[derive(Clone, Default)]
pub struct Telemetry {
    api: Option<BackendApi>,
    beacon: Option<mpsc::Sender<UiEvent>>,
    background: Background,
}

impl Telemetry {
    /// Telemetry that drops every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Telemetry without a queue: every event is its own detached request.
    #[must_use]
    pub fn direct(api: BackendApi, background: Background) -> Self {
        Self { api: Some(api), beacon: None, background }
    }

    /// Start the beacon worker. Must be called inside a tokio runtime.
    /// The worker exits once every clone of the returned `Telemetry` is dropped.
    pub fn with_beacon(api: BackendApi, background: Background, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = spawn_beacon_worker(api.clone(), background.clone(), rx);
        (Self { api: Some(api), beacon: Some(tx), background }, worker)
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.api.is_some()
    }

    /// Queue `event` for delivery. Never fails.
    pub fn emit(&self, event: UiEvent) {
        let Some(api) = &self.api else {
            debug!(category = %event.category, event = %event.event, "telemetry: disabled, event dropped");
            return;
        };

        let event = match &self.beacon {
            Some(queue) => match queue.try_send(event) {
                Ok(()) => return,
                Err(TrySendError::Full(event) | TrySendError::Closed(event)) => {
                    debug!(event = %event.event, "telemetry: beacon unavailable, sending directly");
                    event
                }
            },
            None => event,
        };

        let api = api.clone();
        self.background.spawn(LOG_EVENT_LABEL, async move {
            api.log_event(&event).await.map(drop).map_err(ClientError::from)
        });
    }
}

fn spawn_beacon_worker(api: BackendApi, background: Background, mut rx: mpsc::Receiver<UiEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let result = api.log_event(&event).await.map(drop).map_err(ClientError::from);
            background.report(LOG_EVENT_LABEL, result);
        }
        debug!("telemetry: beacon worker stopped");
    })
}

#[cfg(test)]
#[path = "telemetry_test.rs"]
mod tests;
