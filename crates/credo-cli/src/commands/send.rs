//! Send command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::session::Services;

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Chat session id (defaults to the signed-in user id)
    #[arg(long)]
    pub session_id: Option<String>,

    /// Message text
    pub message: String,
}

pub async fn run(args: SendArgs, services: &Services) -> Result<()> {
    let webhook = services.webhook()?;

    let session_id = match args.session_id {
        Some(id) => id,
        None => services
            .coordinator()
            .status()
            .context("Failed to load credentials")?
            .context("No active session. Run 'credo login' first.")?
            .user_id
            .to_string(),
    };

    eprintln!("{}", "Sending...".dimmed());

    let reply = webhook
        .send_message(&session_id, &args.message)
        .await
        .context("Failed to send message")?;

    println!("{}", reply.output);
    Ok(())
}
