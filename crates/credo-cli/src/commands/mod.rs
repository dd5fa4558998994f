//! Subcommand implementations.

mod login;
mod logout;
mod refresh_token;
mod send;
mod validate;
mod whoami;

use anyhow::Result;
use clap::Subcommand;

use crate::session::Services;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Establish credentials from a completed sign-in
    Login(login::LoginArgs),

    /// Display the signed-in user and token expiry
    Whoami(whoami::WhoamiArgs),

    /// Refresh the access token now
    RefreshToken(refresh_token::RefreshTokenArgs),

    /// Discard the stored credentials
    Logout(logout::LogoutArgs),

    /// Send a chat message to the webhook
    Send(send::SendArgs),

    /// Ask the backend whether it holds a valid token
    Validate(validate::ValidateArgs),
}

pub async fn handle(cmd: Commands, services: &Services) -> Result<()> {
    match cmd {
        Commands::Login(args) => login::run(args, services).await,
        Commands::Whoami(args) => whoami::run(args, services).await,
        Commands::RefreshToken(args) => refresh_token::run(args, services).await,
        Commands::Logout(args) => logout::run(args, services).await,
        Commands::Send(args) => send::run(args, services).await,
        Commands::Validate(args) => validate::run(args, services).await,
    }
}
