//! Opsrelay: Telegram-driven dispatcher that turns structured chat messages
//! into local command runs.
//!
//! This is the main entry point for the `opsrelay` CLI. It initializes
//! logging, parses arguments, dispatches to the appropriate command
//! handler, and handles errors with proper exit codes.

mod actions;
mod cli;
mod commands;
mod config;
mod dispatch;
mod error;
mod executor;
mod exit_codes;
mod message;
mod pool;
mod reply;
mod telegram;
mod translate;

use cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse_args();

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {err}");

            ExitCode::from(err.exit_code() as u8)
        }
    }
}

/// Structured logging to stderr; override with RUST_LOG.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("opsrelay=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
