//! Search-result table with a sticky sort.
//!
//! The chosen sort survives `/refresh`: new rows are re-sorted by the same
//! column and direction before they are shown.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::{PendingRequest, RequestKind};
use crate::net::types::TicketRow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortColumn {
    Key,
    IssueType,
    Summary,
    Assignee,
    Status,
    Updated,
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "key" | "id" => Ok(Self::Key),
            "issue_type" | "type" => Ok(Self::IssueType),
            "summary" => Ok(Self::Summary),
            "assignee" => Ok(Self::Assignee),
            "status" => Ok(Self::Status),
            "updated" => Ok(Self::Updated),
            other => Err(format!("unknown column '{other}'")),
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Key => "key",
            Self::IssueType => "issue_type",
            Self::Summary => "summary",
            Self::Assignee => "assignee",
            Self::Status => "status",
            Self::Updated => "updated",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortState {
    pub column: SortColumn,
    pub ascending: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ResultsTable {
    pub rows: Vec<TicketRow>,
    pub sort: Option<SortState>,
    /// Row highlighted as the current selection.
    pub selected_key: Option<String>,
    pub pending: Option<PendingRequest>,
}

impl ResultsTable {
    /// Clicking the active column flips direction; any other column sorts
    /// ascending.
    pub fn toggle_sort(&mut self, column: SortColumn) {
        let ascending = match self.sort {
            Some(current) if current.column == column => !current.ascending,
            _ => true,
        };
        self.sort = Some(SortState { column, ascending });
        self.apply_sort();
    }

    /// Swap in fresh rows and reapply the chosen sort.
    pub fn replace_rows(&mut self, rows: Vec<TicketRow>) {
        self.rows = rows;
        self.apply_sort();
    }

    pub fn begin_refresh(&mut self) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(PendingRequest::start(RequestKind::Refresh));
        true
    }

    pub fn finish_refresh(&mut self) {
        self.pending = None;
    }

    #[must_use]
    pub fn row(&self, key: &str) -> Option<&TicketRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    fn apply_sort(&mut self) {
        let Some(SortState { column, ascending }) = self.sort else {
            return;
        };
        self.rows.sort_by(|a, b| {
            let ordering = compare_rows(a, b, column);
            if ascending { ordering } else { ordering.reverse() }
        });
    }
}

fn compare_rows(a: &TicketRow, b: &TicketRow, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Key => compare_keys(&a.key, &b.key),
        SortColumn::IssueType => compare_text(&a.issue_type, &b.issue_type),
        SortColumn::Summary => compare_text(&a.summary, &b.summary),
        SortColumn::Assignee => compare_text(&a.assignee, &b.assignee),
        SortColumn::Status => compare_text(&a.status, &b.status),
        SortColumn::Updated => compare_timestamps(a.updated.as_deref(), b.updated.as_deref()),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.trim().to_lowercase().cmp(&b.trim().to_lowercase())
}

/// `PROJ-9` sorts before `PROJ-10` when both suffixes are numeric.
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (key_number(a), key_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => compare_text(a, b),
    }
}

fn key_number(key: &str) -> Option<u64> {
    key.trim().split('-').nth(1)?.parse().ok()
}

fn compare_timestamps(a: Option<&str>, b: Option<&str>) -> Ordering {
    let (a, b) = (a.unwrap_or_default(), b.unwrap_or_default());
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// RFC 3339, also accepting Jira's `+0000` offset form.
fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .or_else(|| OffsetDateTime::parse(&colon_offset(raw)?, &Rfc3339).ok())
}

fn colon_offset(raw: &str) -> Option<String> {
    let split = raw.len().checked_sub(5)?;
    let (head, offset) = raw.split_at_checked(split)?;
    let bytes = offset.as_bytes();
    let signed = matches!(bytes[0], b'+' | b'-') && bytes[1..].iter().all(u8::is_ascii_digit);
    signed.then(|| format!("{head}{}:{}", &offset[..3], &offset[3..]))
}

#[cfg(test)]
#[path = "results_test.rs"]
mod tests;
