//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;
use crate::session::Services;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(_args: LogoutArgs, services: &Services) -> Result<()> {
    services
        .coordinator()
        .sign_out()
        .context("Failed to remove credentials")?;

    output::success("Logged out");
    Ok(())
}
