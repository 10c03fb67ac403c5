//! Client core for a Jira test-scenario helper backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend owns the Jira session and the AI calls. This crate is the
//! client: a JSON transport, best-effort UI telemetry, the AI chat panel, and
//! the ticket selection/generation workflow, each with explicit state that can
//! be driven headlessly.

pub mod background;
pub mod config;
pub mod controller;
pub mod error;
pub mod net;
pub mod repl;
pub mod state;
pub mod telemetry;
pub mod util;
