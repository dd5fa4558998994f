//! Login command implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use clap::Args;
use colored::Colorize;
use tracing::warn;

use credo_core::{AccessToken, CredentialSet, RefreshToken, TokenGrant, UserId};
use credo_http::SignInProfile;

use crate::output;
use crate::session::Services;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Identity provider user id
    #[arg(long)]
    pub user_id: String,

    /// Access token issued at sign-in
    #[arg(long, env = "CREDO_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Refresh token issued at sign-in
    #[arg(long, env = "CREDO_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = 3600, conflicts_with = "expires_at")]
    pub expires_in_secs: i64,

    /// Absolute access token expiry (RFC 3339)
    #[arg(long)]
    pub expires_at: Option<DateTime<Utc>>,

    /// Email reported by the identity provider; registers the grant with the backend
    #[arg(long)]
    pub email: Option<String>,

    /// Display name reported by the identity provider
    #[arg(long, requires = "email")]
    pub display_name: Option<String>,

    /// Profile photo URL reported by the identity provider
    #[arg(long, requires = "email")]
    pub photo_url: Option<String>,

    /// Granted OAuth scope (repeatable)
    #[arg(long = "scope", requires = "email")]
    pub scopes: Vec<String>,
}

pub async fn run(args: LoginArgs, services: &Services) -> Result<()> {
    let user_id = UserId::new(&args.user_id).context("Invalid user id")?;
    let expires_at = match args.expires_at {
        Some(at) => at,
        None => TimeDelta::try_seconds(args.expires_in_secs)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .context("--expires-in-secs is out of range")?,
    };

    let grant = TokenGrant::new(AccessToken::new(args.access_token), expires_at);
    let refresh_token = args
        .refresh_token
        .filter(|t| !t.is_empty())
        .map(RefreshToken::new);
    let set = CredentialSet::new(user_id, grant, refresh_token);

    services
        .coordinator()
        .establish(set.clone())
        .context("Failed to establish credentials")?;

    if let Some(email) = args.email {
        eprintln!("{}", "Registering with backend...".dimmed());

        let display_name = args.display_name.unwrap_or_else(|| set.user_id().to_string());
        let mut profile = SignInProfile::new(email, display_name).with_scopes(args.scopes);
        if let Some(photo_url) = args.photo_url {
            profile = profile.with_photo_url(photo_url);
        }

        if let Err(err) = services.backend().register(&set, &profile).await {
            warn!(error = %err, "Backend registration failed");
            output::warning(&format!("Backend registration failed: {}", err));
        }
    }

    output::success("Logged in successfully");
    println!();
    output::field("User", set.user_id().as_str());
    output::field("Expires", &set.expires_at().to_rfc3339());
    if set.refresh_token().is_none() {
        output::warning("No refresh token; sign in again when the access token expires");
    }

    Ok(())
}
