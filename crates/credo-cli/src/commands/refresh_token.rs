//! Refresh token command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::output;
use crate::session::Services;

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(_args: RefreshTokenArgs, services: &Services) -> Result<()> {
    eprintln!("{}", "Refreshing access token...".dimmed());

    services
        .coordinator()
        .force_refresh()
        .await
        .context("Failed to refresh access token")?;

    let status = services
        .coordinator()
        .status()
        .context("Failed to load credentials")?
        .context("Session ended during refresh")?;

    output::success("Access token refreshed successfully");
    output::field("User", status.user_id.as_str());
    output::field("Expires", &status.expires_at.to_rfc3339());

    Ok(())
}
