//! Detached fire-and-forget tasks.
//!
//! DESIGN
//! ======
//! Telemetry and session persistence must never block or fail the flow that
//! triggered them. Each job runs as its own tokio task; its result is logged
//! and swallowed. When an outcome channel is attached, the result is also
//! reported there so tests can observe what happened.

use std::future::Future;

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::ClientError;
use crate::net::transport::TransportError;

/// Result of one detached job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub label: &'static str,
    pub result: Result<(), ClientError>,
}

/// Spawner for detached jobs. Clones share the outcome channel.
#[derive(Clone, Debug, Default)]
pub struct Background {
    outcomes: Option<mpsc::UnboundedSender<TaskOutcome>>,
}

impl Background {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawner that also reports every outcome on the returned receiver.
    #[must_use]
    pub fn with_outcomes() -> (Self, mpsc::UnboundedReceiver<TaskOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { outcomes: Some(tx) }, rx)
    }

    /// Run `job` without awaiting it. Outside a tokio runtime the job is
    /// dropped and reported as a network failure.
    pub fn spawn<F>(&self, label: &'static str, job: F)
    where
        F: Future<Output = Result<(), ClientError>> + Send + 'static,
    {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(label, "background: no runtime, job dropped");
            self.report(label, Err(TransportError::Network("no async runtime".to_owned()).into()));
            return;
        };
        let this = self.clone();
        handle.spawn(async move {
            let result = job.await;
            this.report(label, result);
        });
    }

    /// Log a finished job and forward it to the outcome channel, if any.
    pub fn report(&self, label: &'static str, result: Result<(), ClientError>) {
        match &result {
            Ok(()) => debug!(label, "background: job finished"),
            Err(e) => debug!(label, error = %e, "background: job failed (ignored)"),
        }
        if let Some(tx) = &self.outcomes {
            let _ = tx.send(TaskOutcome { label, result });
        }
    }
}

#[cfg(test)]
#[path = "background_test.rs"]
mod tests;
