//! credo - command line shell for the OAuth credential lifecycle.
//!
//! Establishes credentials handed over by an external sign-in, keeps them
//! fresh through the token backend and sends chat messages to the webhook
//! with a valid bearer token.

mod cli;
mod commands;
mod output;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::Cli;
use session::Services;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let services = Services::open(&cli.settings)?;
    let mut expiry = services.watch_expiry();

    let result = commands::handle(cli.command, &services).await;

    if let Some(user_id) = expiry.expired() {
        output::error(&format!(
            "Session for '{}' has expired. Run 'credo login' to sign in again.",
            user_id
        ));
    }

    result
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so command output stays machine-readable
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
