//! Client state modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each panel keeps its state in an explicit struct with sans-IO transitions.
//! Controllers perform the network calls and feed results back through these
//! transitions, so every state change can be asserted without a server.

pub mod chat;
pub mod results;
pub mod selection;

use std::time::{Duration, Instant};

/// Which request a panel is waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Chat,
    Select,
    Deselect,
    Generate,
    Regenerate,
    ManualPrompt,
    Preview,
    Confirm,
    Refresh,
}

impl RequestKind {
    /// Requests that put the workflow into its `Generating` state.
    #[must_use]
    pub fn is_generation(self) -> bool {
        matches!(self, Self::Generate | Self::Regenerate | Self::ManualPrompt)
    }
}

/// The single in-flight request slot of a panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub kind: RequestKind,
    pub started_at: Instant,
}

impl PendingRequest {
    #[must_use]
    pub fn start(kind: RequestKind) -> Self {
        Self { kind, started_at: Instant::now() }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Visual weight of a banner or inline notice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tone {
    #[default]
    Info,
    Success,
    Warning,
    Danger,
}

/// Short message shown next to the action that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub tone: Tone,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self { tone, text: text.into() }
    }
}

#[cfg(test)]
#[path = "pending_test.rs"]
mod tests;
