//! Command implementations for opsrelay.
//!
//! Routes parsed CLI commands to their implementations.

use crate::cli::{Cli, Command, DispatchArgs};
use crate::config::Config;
use crate::dispatch::dispatch_reply;
use crate::error::{RelayError, Result};
use crate::telegram;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Dispatch a CLI command to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    match cli.command {
        Command::Run => cmd_run(&config_path),
        Command::Check => cmd_check(&config_path),
        Command::Actions => cmd_actions(&config_path),
        Command::Dispatch(args) => cmd_dispatch(&config_path, args),
    }
}

/// `~/.config/opsrelay.yaml`.
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME").ok_or_else(|| {
        RelayError::Config(
            "cannot determine home directory; pass --config explicitly".to_string(),
        )
    })?;
    Ok(PathBuf::from(home).join(".config").join("opsrelay.yaml"))
}

fn cmd_run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    config.bot_token()?;
    telegram::run(&config)
}

fn cmd_check(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    config.bot_token()?;
    let table = config.action_table()?;
    println!(
        "Configuration OK: {} custom action(s), {} total including built-ins",
        config.actions.len(),
        table.len()
    );
    Ok(())
}

fn cmd_actions(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let table = config.action_table()?;
    println!("{}", table.listing());
    Ok(())
}

fn cmd_dispatch(config_path: &Path, args: DispatchArgs) -> Result<()> {
    let config = Config::load(config_path)?;
    let table = config.action_table()?;

    let raw = match args.file {
        Some(path) => std::fs::read_to_string(&path).map_err(|e| {
            RelayError::Config(format!("failed to read message '{}': {}", path.display(), e))
        })?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer).map_err(|e| {
                RelayError::Config(format!("failed to read message from stdin: {e}"))
            })?;
            buffer
        }
    };

    let reply = dispatch_reply(&table, &config.dispatch_limits(), raw.trim());
    println!("{reply}");
    Ok(())
}
