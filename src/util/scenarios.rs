//! Scenario list sanitation.
//!
//! AI output often opens with a line like "Here are concise test scenarios:".
//! Those lines are dropped before anything is displayed or written into the
//! selected ticket.

const PREAMBLE_MARKERS: [&str; 2] = ["here are", "test scenario"];

/// True when `line` looks like an introduction rather than a scenario.
#[must_use]
pub fn is_preamble(line: &str) -> bool {
    let lower = line.to_lowercase();
    PREAMBLE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Drop preamble-like lines, keeping order. Idempotent.
#[must_use]
pub fn filter_preamble<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .map(AsRef::as_ref)
        .filter(|line| !is_preamble(line))
        .map(str::to_owned)
        .collect()
}

/// `1. first`, `2. second`, ... as shown in the test-case view.
#[must_use]
pub fn numbered(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {line}", i + 1))
        .collect()
}

#[cfg(test)]
#[path = "scenarios_test.rs"]
mod tests;
