//! CLI argument parsing for opsrelay.
//!
//! Uses clap derive macros for declarative argument definitions. This
//! module defines the command structure; implementations live in the
//! `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Opsrelay: Telegram-driven dispatcher for local command runs.
///
/// Incoming chat messages are small TOML blocks naming a configured action
/// and its parameters; opsrelay resolves the action, runs the command, and
/// replies with the result.
#[derive(Parser, Debug)]
#[command(name = "opsrelay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file (default: ~/.config/opsrelay.yaml).
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for opsrelay.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to Telegram and dispatch incoming action messages.
    ///
    /// Long-polls the Bot API and answers every action message with the
    /// outcome of running its command.
    Run,

    /// Load and validate the configuration file.
    ///
    /// Reports the first problem found, or a summary of the configured
    /// actions on success.
    Check,

    /// List available actions.
    ///
    /// Prints built-in and custom actions with their descriptions.
    Actions,

    /// Dispatch a single message locally and print the reply.
    ///
    /// Reads the message from a file or stdin and runs the full
    /// parse/resolve/execute/format pipeline without touching Telegram.
    /// Useful for trying out action configurations.
    Dispatch(DispatchArgs),
}

/// Arguments for the dispatch command.
#[derive(clap::Args, Debug)]
pub struct DispatchArgs {
    /// Read the message from this file instead of stdin.
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
