//! Whoami command implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use credo_file::CREDENTIALS_FILE;

use crate::output;
use crate::session::Services;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the session as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct WhoamiOutput<'a> {
    user_id: &'a str,
    expires_at: DateTime<Utc>,
    expires_in_secs: i64,
    near_expiry: bool,
    refreshable: bool,
}

pub async fn run(args: WhoamiArgs, services: &Services) -> Result<()> {
    let status = services
        .coordinator()
        .status()
        .context("Failed to load credentials")?
        .context("No active session. Run 'credo login' first.")?;

    let expires_in = status.expires_at - Utc::now();

    if args.json {
        return output::json_pretty(&WhoamiOutput {
            user_id: status.user_id.as_str(),
            expires_at: status.expires_at,
            expires_in_secs: expires_in.num_seconds(),
            near_expiry: status.near_expiry,
            refreshable: status.refreshable,
        });
    }

    output::field("User", status.user_id.as_str());
    output::field("Expires", &status.expires_at.to_rfc3339());
    output::field("Expires in", &format!("{}m", expires_in.num_minutes()));
    output::field(
        "Status",
        if status.near_expiry {
            "refresh due"
        } else {
            "fresh"
        },
    );
    output::field("Refreshable", if status.refreshable { "yes" } else { "no" });
    output::field(
        "Stored at",
        &services.data_dir().join(CREDENTIALS_FILE).display().to_string(),
    );

    Ok(())
}
