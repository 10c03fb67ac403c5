//! Line-oriented driver for the controllers.
//!
//! SYSTEM CONTEXT
//! ==============
//! The binary reads one command per line and runs it against a single
//! [`Desk`], so the server session cookie and all panel state persist for
//! the whole run. Parsing is pure ([`parse_line`]); execution prints the
//! resulting state to any `Write`.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::controller::chat::ChatController;
use crate::controller::workflow::SelectionWorkflow;
use crate::controller::{ClientContext, session};
use crate::error::{ClientError, ErrorClass};
use crate::net::types::TicketRef;
use crate::state::chat::Role;
use crate::state::results::SortColumn;
use crate::state::selection::{SelectionView, UpdateSaga};
use crate::util::render::RenderMode;

pub const HELP: &str = "\
commands:
  connect <jira_url> <email> <api_token>
  key set <api_key> | key clear | key status
  open | close
  chat <text> | regen | copy <n> | logout
  mode <markdown|text>
  select <key> | select <key> <url> [summary...] | deselect | search
  generate | prompt <instruction>
  preview | edit <text, \\n for newlines> | confirm | cancel
  refresh | sort <column>
  show | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect { jira_url: String, email: String, api_token: String },
    KeySet(String),
    KeyClear,
    KeyStatus,
    Open,
    Close,
    Chat(String),
    Regenerate,
    Copy(usize),
    Logout,
    Mode(RenderMode),
    Select(TicketRef),
    SelectRow(String),
    Deselect,
    Search,
    Generate,
    Prompt(String),
    Preview,
    Edit(String),
    Confirm,
    Cancel,
    Refresh,
    Sort(SortColumn),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ReplError {
    #[error("output failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
///
/// # Errors
///
/// Unknown commands and missing or malformed arguments.
pub fn parse_line(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match word.to_ascii_lowercase().as_str() {
        "connect" => match args.as_slice() {
            [url, email, token] => Command::Connect {
                jira_url: (*url).to_owned(),
                email: (*email).to_owned(),
                api_token: (*token).to_owned(),
            },
            _ => return Err(ParseError::Usage("connect <jira_url> <email> <api_token>")),
        },
        "key" => match args.as_slice() {
            ["set", key] => Command::KeySet((*key).to_owned()),
            ["clear"] => Command::KeyClear,
            ["status"] => Command::KeyStatus,
            _ => return Err(ParseError::Usage("key set <api_key> | key clear | key status")),
        },
        "open" => Command::Open,
        "close" => Command::Close,
        "chat" => Command::Chat(required(rest, "chat <text>")?),
        "regen" | "regenerate" => Command::Regenerate,
        "copy" => match args.as_slice() {
            [n] => Command::Copy(n.parse().map_err(|_| ParseError::Invalid(format!("not a message number: {n}")))?),
            _ => return Err(ParseError::Usage("copy <n>")),
        },
        "logout" => Command::Logout,
        "mode" => match args.as_slice() {
            [mode] => Command::Mode(mode.parse().map_err(ParseError::Invalid)?),
            _ => return Err(ParseError::Usage("mode <markdown|text>")),
        },
        "select" => match args.as_slice() {
            [key] => Command::SelectRow((*key).to_owned()),
            [key, url, summary @ ..] => Command::Select(TicketRef {
                key: (*key).to_owned(),
                url: (*url).to_owned(),
                summary: summary.join(" "),
            }),
            _ => return Err(ParseError::Usage("select <key> [<url> [summary...]]")),
        },
        "deselect" => Command::Deselect,
        "search" => Command::Search,
        "generate" => Command::Generate,
        "prompt" => Command::Prompt(required(rest, "prompt <instruction>")?),
        "preview" => Command::Preview,
        "edit" => Command::Edit(required(rest, "edit <text>")?.replace("\\n", "\n")),
        "confirm" => Command::Confirm,
        "cancel" => Command::Cancel,
        "refresh" => Command::Refresh,
        "sort" => match args.as_slice() {
            [column] => Command::Sort(column.parse().map_err(ParseError::Invalid)?),
            _ => return Err(ParseError::Usage("sort <key|issue_type|summary|assignee|status|updated>")),
        },
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_owned())),
    };
    Ok(Some(command))
}

fn required(rest: &str, usage: &'static str) -> Result<String, ParseError> {
    if rest.is_empty() { Err(ParseError::Usage(usage)) } else { Ok(rest.to_owned()) }
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Both panels plus the shared context, driven one command at a time.
pub struct Desk {
    ctx: ClientContext,
    chat: ChatController,
    workflow: SelectionWorkflow,
}

impl Desk {
    #[must_use]
    pub fn new(ctx: ClientContext, render_mode: RenderMode) -> Self {
        Self {
            chat: ChatController::new(ctx.clone(), render_mode),
            workflow: SelectionWorkflow::new(ctx.clone()),
            ctx,
        }
    }

    #[must_use]
    pub fn chat(&self) -> &ChatController {
        &self.chat
    }

    #[must_use]
    pub fn workflow(&self) -> &SelectionWorkflow {
        &self.workflow
    }

    /// Run one command. Returns false when the loop should stop.
    ///
    /// # Errors
    ///
    /// Only failures writing to `out`; command failures are printed.
    pub async fn execute(&mut self, command: Command, out: &mut impl Write) -> Result<bool, ReplError> {
        let result: Result<(), ClientError> = match command {
            Command::Connect { jira_url, email, api_token } => {
                match session::connect(&self.ctx, &jira_url, &email, &api_token).await {
                    Ok(user) => {
                        writeln!(out, "connected as {} <{}>", user.display_name, user.email)?;
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
            Command::KeySet(key) => self.chat.save_key(&key).await,
            Command::KeyClear => self.chat.clear_key().await,
            Command::KeyStatus => match self.ctx.bounded(self.ctx.api.has_key()).await {
                Ok(has_key) => {
                    writeln!(out, "api key: {}", if has_key { "present" } else { "missing" })?;
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
            Command::Open => self.chat.check_key_and_open().await.map(drop),
            Command::Close => {
                self.chat.close();
                Ok(())
            }
            Command::Chat(text) => self.chat.send_message(&text).await,
            Command::Regenerate => match self.chat.regenerate().await {
                Ok(false) => {
                    writeln!(out, "no earlier message to regenerate")?;
                    Ok(())
                }
                other => other.map(drop),
            },
            Command::Copy(n) => {
                let text = n
                    .checked_sub(1)
                    .and_then(|i| self.chat.state().messages.get(i))
                    .and_then(|m| self.chat.copy_text(&m.id));
                match text {
                    Some(text) => writeln!(out, "{text}")?,
                    None => writeln!(out, "message {n} cannot be copied")?,
                }
                Ok(())
            }
            Command::Logout => {
                self.chat.logout().await;
                Ok(())
            }
            Command::Mode(mode) => {
                self.chat.set_render_mode(mode);
                Ok(())
            }
            Command::Select(ticket) => self.workflow.select(&ticket).await,
            Command::SelectRow(key) => self.workflow.select_row(&key).await,
            Command::Deselect => {
                self.workflow.deselect().await;
                Ok(())
            }
            Command::Search => {
                self.workflow.new_search();
                Ok(())
            }
            Command::Generate => self.workflow.generate().await,
            Command::Prompt(instruction) => self.workflow.manual_prompt(&instruction).await,
            Command::Preview => self.workflow.load_preview().await,
            Command::Edit(text) => self.workflow.edit_preview(&text),
            Command::Confirm => self.workflow.confirm_update().await,
            Command::Cancel => {
                self.workflow.cancel_update();
                Ok(())
            }
            Command::Refresh => {
                if !self.workflow.refresh().await {
                    debug!("repl: refresh made no change");
                }
                Ok(())
            }
            Command::Sort(column) => {
                self.workflow.sort_by(column);
                Ok(())
            }
            Command::Show => Ok(()),
            Command::Help => {
                writeln!(out, "{HELP}")?;
                return Ok(true);
            }
            Command::Quit => return Ok(false),
        };

        if let Err(e) = result {
            writeln!(out, "error: {e}{}", remedy(e.class()))?;
        }
        self.print_state(out)?;
        Ok(true)
    }

    fn print_state(&self, out: &mut impl Write) -> std::io::Result<()> {
        let chat = self.chat.state();
        if let Some(banner) = &chat.banner {
            writeln!(out, "[ai {:?}] {}", banner.tone, banner.text)?;
        }
        for (i, message) in chat.messages.iter().enumerate() {
            let who = match message.role {
                Role::User => "you",
                Role::Assistant => "ai",
            };
            writeln!(out, "  {}. {who}: {}", i + 1, message.text)?;
        }

        let selection = self.workflow.selection();
        match &selection.view {
            SelectionView::Empty => writeln!(out, "selected: none")?,
            SelectionView::Loading { key } => writeln!(out, "selected: loading {key}...")?,
            SelectionView::Error(message) => writeln!(out, "selected: error: {message}")?,
            SelectionView::Ticket(view) => {
                writeln!(out, "selected: {} {} ({})", view.key, view.summary, view.url)?;
                for scenario in &view.scenarios {
                    writeln!(out, "  - {scenario}")?;
                }
                writeln!(out, "  [{}]", view.generate_label)?;
            }
        }
        if let Some(notice) = &selection.notice {
            writeln!(out, "[{:?}] {}", notice.tone, notice.text)?;
        }
        match &selection.update {
            UpdateSaga::Idle => {}
            UpdateSaga::LoadingPreview => writeln!(out, "update: loading preview")?,
            UpdateSaga::PreviewReady { updated, .. } => writeln!(out, "update: preview ready\n{updated}")?,
            UpdateSaga::PreviewFailed(reason) => writeln!(out, "update: preview failed: {reason} (retry with 'preview')")?,
            UpdateSaga::Confirming { .. } => writeln!(out, "update: confirming")?,
            UpdateSaga::Committed(message) => writeln!(out, "update: {message}")?,
        }

        let table = self.workflow.table();
        if !table.rows.is_empty() {
            writeln!(out, "results:")?;
            for row in &table.rows {
                let marker = if table.selected_key.as_deref() == Some(row.key.as_str()) { '*' } else { ' ' };
                writeln!(out, " {marker} {} [{}] {} ({})", row.key, row.status, row.summary, row.assignee)?;
            }
        }
        Ok(())
    }
}

/// Follow-up hint printed after an error.
fn remedy(class: ErrorClass) -> &'static str {
    match class {
        ErrorClass::Network | ErrorClass::Unavailable => " (try again)",
        ErrorClass::Credential => " (re-enter with 'key set <api_key>' or 'key clear')",
        ErrorClass::Application | ErrorClass::Validation => "",
    }
}

/// Read commands until EOF or `quit`.
///
/// # Errors
///
/// Input read failures and output write failures.
pub async fn run<R, W>(desk: &mut Desk, input: R, out: &mut W) -> Result<(), ReplError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(command)) => {
                if !desk.execute(command, out).await? {
                    break;
                }
            }
            Err(e) => writeln!(out, "{e}")?,
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "repl_test.rs"]
mod tests;
