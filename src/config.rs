//! Client configuration parsed from environment variables.

use std::time::Duration;

use crate::util::render::RenderMode;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TELEMETRY_QUEUE: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base url '{0}' (expected http:// or https://)")]
    InvalidBaseUrl(String),
    #[error("{0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeouts: Timeouts,
    pub render_mode: RenderMode,
    pub telemetry: bool,
    pub telemetry_queue: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            render_mode: RenderMode::default(),
            telemetry: true,
            telemetry_queue: DEFAULT_TELEMETRY_QUEUE,
        }
    }
}

impl ClientConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `SCENARIO_DESK_BASE_URL`: default `http://127.0.0.1:5000`
    /// - `SCENARIO_DESK_REQUEST_TIMEOUT_SECS`: default 60
    /// - `SCENARIO_DESK_CONNECT_TIMEOUT_SECS`: default 10
    /// - `SCENARIO_DESK_RENDER_MODE`: `markdown` (default) or `text`
    /// - `SCENARIO_DESK_TELEMETRY`: `on` (default) or `off`
    /// - `SCENARIO_DESK_TELEMETRY_QUEUE`: default 64
    ///
    /// # Errors
    ///
    /// An unusable base URL, render mode or telemetry switch, or a zero
    /// timeout or queue size.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] over an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(lookup("SCENARIO_DESK_BASE_URL").as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let timeouts = Timeouts {
            request_secs: nonzero(
                "SCENARIO_DESK_REQUEST_TIMEOUT_SECS",
                parse_or(&lookup, "SCENARIO_DESK_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            )?,
            connect_secs: nonzero(
                "SCENARIO_DESK_CONNECT_TIMEOUT_SECS",
                parse_or(&lookup, "SCENARIO_DESK_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            )?,
        };
        let render_mode = match lookup("SCENARIO_DESK_RENDER_MODE") {
            Some(raw) => raw.parse().map_err(ConfigError::Parse)?,
            None => RenderMode::default(),
        };
        let telemetry = parse_switch(lookup("SCENARIO_DESK_TELEMETRY").as_deref())?;
        let telemetry_queue = nonzero(
            "SCENARIO_DESK_TELEMETRY_QUEUE",
            parse_or(&lookup, "SCENARIO_DESK_TELEMETRY_QUEUE", DEFAULT_TELEMETRY_QUEUE),
        )?;

        Ok(Self { base_url, timeouts, render_mode, telemetry, telemetry_queue })
    }
}

/// Trailing `/` trimmed; scheme must be http or https.
///
/// # Errors
///
/// `InvalidBaseUrl` for any other scheme.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigError::InvalidBaseUrl(raw.to_owned()))
    }
}

fn parse_or<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn nonzero<T: Default + PartialEq>(key: &str, value: T) -> Result<T, ConfigError> {
    if value == T::default() {
        return Err(ConfigError::Parse(format!("{key} must be greater than 0")));
    }
    Ok(value)
}

fn parse_switch(raw: Option<&str>) -> Result<bool, ConfigError> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("on" | "true" | "1") => Ok(true),
        Some("off" | "false" | "0") => Ok(false),
        Some(other) => Err(ConfigError::Parse(format!(
            "unsupported SCENARIO_DESK_TELEMETRY '{other}' (expected 'on' or 'off')"
        ))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
