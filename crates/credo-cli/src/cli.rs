//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser};
use credo_core::config::DEFAULT_REFRESH_BUFFER_SECS;

use crate::commands::Commands;

/// Token backend used when none is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8001";

/// Keep OAuth credentials fresh and make authenticated calls with them.
#[derive(Parser, Debug)]
#[command(name = "credo")]
#[command(author, version = env!("CREDO_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where credentials live and which services they are used with.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Directory holding the credentials file
    #[arg(long, env = "CREDO_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the token backend
    #[arg(long, env = "CREDO_BACKEND_URL", global = true, default_value = DEFAULT_BACKEND_URL)]
    pub backend_url: String,

    /// URL of the chat webhook
    #[arg(long, env = "CREDO_WEBHOOK_URL", global = true)]
    pub webhook_url: Option<String>,

    /// Refresh access tokens this many seconds before they expire
    #[arg(
        long,
        env = "CREDO_REFRESH_BUFFER_SECS",
        global = true,
        default_value_t = DEFAULT_REFRESH_BUFFER_SECS,
        value_parser = clap::value_parser!(i64).range(0..)
    )]
    pub refresh_buffer_secs: i64,
}
