#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

/// Run the CLI binary against an isolated credentials directory.
///
/// `CREDO_*` variables from the caller's environment are removed so the
/// test only sees what it passes in `env`.
pub fn run_cli(args: &[&str], data_dir: &Path, env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_credo"));
    cmd.args(args);
    for var in [
        "CREDO_BACKEND_URL",
        "CREDO_WEBHOOK_URL",
        "CREDO_REFRESH_BUFFER_SECS",
        "CREDO_ACCESS_TOKEN",
        "CREDO_REFRESH_TOKEN",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("CREDO_DATA_DIR", data_dir);
    // Nothing listens here; commands that need the backend must override it
    cmd.env("CREDO_BACKEND_URL", "http://127.0.0.1:9");
    cmd.env("NO_COLOR", "1");
    cmd.envs(env.iter().copied());
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success, returning stdout.
pub fn run_cli_success(args: &[&str], data_dir: &Path, env: &[(&str, &str)]) -> String {
    let output = run_cli(args, data_dir, env);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure, returning stderr.
pub fn run_cli_failure(args: &[&str], data_dir: &Path, env: &[(&str, &str)]) -> String {
    let output = run_cli(args, data_dir, env);
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Sign in as `user-1` with the given token lifetime.
pub fn login(data_dir: &Path, access_token: &str, expires_in_secs: i64) {
    let lifetime = expires_in_secs.to_string();
    run_cli_success(
        &[
            "login",
            "--user-id",
            "user-1",
            "--access-token",
            access_token,
            "--refresh-token",
            "refresh-1",
            "--expires-in-secs",
            &lifetime,
        ],
        data_dir,
        &[],
    );
}
