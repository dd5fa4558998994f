//! Validate command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session::Services;

#[derive(Args, Debug)]
pub struct ValidateArgs {}

pub async fn run(_args: ValidateArgs, services: &Services) -> Result<()> {
    let status = services
        .coordinator()
        .status()
        .context("Failed to load credentials")?
        .context("No active session. Run 'credo login' first.")?;

    let validation = services
        .backend()
        .validate_token(&status.user_id)
        .await
        .context("Failed to validate token with backend")?;

    if validation.valid {
        output::success("Backend holds a valid token");
    } else {
        output::error("Backend holds no valid token");
    }
    if let Some(message) = validation.message {
        output::field("Message", &message);
    }
    if let Some(email) = validation.email {
        output::field("Email", &email);
    }
    if let Some(display_name) = validation.display_name {
        output::field("Name", &display_name);
    }

    Ok(())
}
