//! Jira connection.

use tracing::{info, warn};

use super::{ClientContext, server_text};
use crate::error::{ClientError, ValidationError};
use crate::net::transport::TransportError;
use crate::net::types::JiraUser;

/// Connect the server session to Jira. All three fields are required; a blank
/// one fails before any request is made.
///
/// # Errors
///
/// `MissingConnectFields`, transport failures, or an application error
/// carrying the server message (or `Connection failed (<status>)`).
pub async fn connect(ctx: &ClientContext, jira_url: &str, email: &str, api_token: &str) -> Result<JiraUser, ClientError> {
    let (jira_url, email, api_token) = (jira_url.trim(), email.trim(), api_token.trim());
    if jira_url.is_empty() || email.is_empty() || api_token.is_empty() {
        return Err(ValidationError::MissingConnectFields.into());
    }

    let response = match ctx.bounded(ctx.api.connect(jira_url, email, api_token)).await {
        Ok(response) => response,
        Err(error @ TransportError::Application { status, .. }) => {
            let message = server_text(&error).map_or_else(|| format!("Connection failed ({status})"), str::to_owned);
            warn!(status, %message, "session: connect rejected");
            return Err(TransportError::Application { status, message }.into());
        }
        Err(e) => {
            warn!(error = %e, "session: connect failed");
            return Err(e.into());
        }
    };

    if !response.success {
        let message = response.message.unwrap_or_else(|| "Connection failed (200)".to_owned());
        return Err(TransportError::Application { status: 200, message }.into());
    }

    let user = response.user.unwrap_or_default();
    info!(user = %user.display_name, "session: connected to jira");
    Ok(user)
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
