//! Configuration model for opsrelay.
//!
//! The configuration lives in a single YAML file (by default
//! `~/.config/opsrelay.yaml`) and is loaded once; the dispatch path only
//! ever sees the immutable `ActionTable` built from it.
//!
//! # File format
//!
//! ```yaml
//! telegram:
//!   bot_token: "123456:ABC-DEF..."
//!
//! settings:
//!   timeout_seconds: 30
//!   max_parallel: 4
//!
//! actions:
//!   deploy:
//!     command: "docker-compose up -d"
//!     description: "Deploy the stack"
//!     working_dir: "/srv/app"
//!   backup:
//!     command: "./scripts/backup.sh"
//!     timeout_seconds: 300
//! ```
//!
//! Action names starting with an uppercase letter are rejected: that
//! namespace is reserved for built-in actions. Commands are split on
//! shell-style word boundaries here, at load time, and never re-split with
//! message-derived data.

use crate::actions::{ActionDefinition, ActionEntry, ActionTable, CommandTemplate, is_builtin_name};
use crate::dispatch::DispatchLimits;
use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_PARALLEL: usize = 4;
const DEFAULT_QUEUE_DEPTH: usize = 32;
const DEFAULT_CAPTURE_LIMIT_KIB: usize = 64;
const DEFAULT_POLL_TIMEOUT_SECONDS: u64 = 30;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub telegram: TelegramSection,
    pub settings: Settings,
    pub actions: BTreeMap<String, ActionConfig>,
}

/// Chat transport credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    pub bot_token: String,
}

/// Dispatcher-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default command timeout in seconds; actions may override it.
    pub timeout_seconds: u64,
    /// Maximum number of simultaneously executing actions.
    pub max_parallel: usize,
    /// Messages that may wait for a free worker before `submit` blocks.
    pub queue_depth: usize,
    /// Per-stream output capture cap in KiB.
    pub capture_limit_kib: usize,
    /// Long-poll timeout for the Telegram `getUpdates` call.
    pub poll_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_parallel: DEFAULT_MAX_PARALLEL,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            capture_limit_kib: DEFAULT_CAPTURE_LIMIT_KIB,
            poll_timeout_seconds: DEFAULT_POLL_TIMEOUT_SECONDS,
        }
    }
}

/// One configured action record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Executable plus fixed leading arguments.
    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Working directory for the command; defaults to ours when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Timeout override in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Config {
    /// Load and validate the configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!(
                "failed to read config '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from a YAML string. An empty file
    /// is an empty configuration, not an error.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml)
                .map_err(|e| RelayError::Config(format!("failed to parse config: {e}")))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate everything except the bot token, which only `run` needs.
    pub fn validate(&self) -> Result<()> {
        if self.settings.timeout_seconds == 0 {
            return Err(RelayError::Config(
                "settings.timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.settings.max_parallel == 0 {
            return Err(RelayError::Config(
                "settings.max_parallel must be greater than 0".to_string(),
            ));
        }
        if self.settings.capture_limit_kib == 0 {
            return Err(RelayError::Config(
                "settings.capture_limit_kib must be greater than 0".to_string(),
            ));
        }

        for (name, action) in &self.actions {
            if name.is_empty() {
                return Err(RelayError::Config(
                    "action names cannot be empty".to_string(),
                ));
            }
            if is_builtin_name(name) {
                return Err(RelayError::Config(format!(
                    "action '{name}' starts with an uppercase letter, \
                     which is reserved for built-in actions"
                )));
            }
            if action.command.trim().is_empty() {
                return Err(RelayError::Config(format!(
                    "action '{name}' is missing required 'command' field"
                )));
            }
            CommandTemplate::parse(&action.command).map_err(|e| {
                RelayError::Config(format!(
                    "action '{name}' has an invalid command: {e}\n\
                     Fix: check for unmatched quotes or invalid escape sequences."
                ))
            })?;
            if action.timeout_seconds == Some(0) {
                return Err(RelayError::Config(format!(
                    "action '{name}' has timeout_seconds of 0"
                )));
            }
        }

        Ok(())
    }

    /// Bot token, required for `run` and `check`.
    pub fn bot_token(&self) -> Result<&str> {
        let token = self.telegram.bot_token.trim();
        if token.is_empty() {
            return Err(RelayError::Config(
                "missing or invalid Telegram bot token (telegram.bot_token)".to_string(),
            ));
        }
        Ok(token)
    }

    /// Build the immutable action table: built-ins plus every configured
    /// action, with commands pre-split.
    pub fn action_table(&self) -> Result<ActionTable> {
        let mut table = ActionTable::with_builtins();
        for (name, action) in &self.actions {
            let template = CommandTemplate::parse(&action.command).map_err(|e| {
                RelayError::Config(format!("action '{name}' has an invalid command: {e}"))
            })?;
            table.insert(ActionEntry::Command(ActionDefinition {
                name: name.clone(),
                template,
                description: action.description.clone(),
                working_dir: action.working_dir.clone(),
                timeout: action.timeout_seconds.map(Duration::from_secs),
            }));
        }
        Ok(table)
    }

    pub fn dispatch_limits(&self) -> DispatchLimits {
        DispatchLimits {
            timeout: Duration::from_secs(self.settings.timeout_seconds),
            capture_limit: self.settings.capture_limit_kib * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let config = Config::from_yaml(
            r#"
telegram:
  bot_token: "123:abc"
actions:
  deploy:
    command: "docker-compose up -d"
"#,
        )
        .unwrap();

        assert_eq!(config.bot_token().unwrap(), "123:abc");
        assert_eq!(config.actions.len(), 1);
        assert_eq!(config.settings.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn empty_config_gets_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert!(config.actions.is_empty());
        assert_eq!(config.settings.max_parallel, DEFAULT_MAX_PARALLEL);
        assert!(config.bot_token().is_err());
    }

    #[test]
    fn parses_full_action_record() {
        let config = Config::from_yaml(
            r#"
actions:
  backup:
    command: "./scripts/backup.sh --full"
    description: "Nightly backup"
    working_dir: "/srv/data"
    timeout_seconds: 300
"#,
        )
        .unwrap();

        let action = &config.actions["backup"];
        assert_eq!(action.description.as_deref(), Some("Nightly backup"));
        assert_eq!(action.working_dir.as_deref(), Some(Path::new("/srv/data")));
        assert_eq!(action.timeout_seconds, Some(300));
    }

    #[test]
    fn rejects_uppercase_action_name() {
        let err = Config::from_yaml(
            r#"
actions:
  Deploy:
    command: "echo hi"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("reserved for built-in actions"));
    }

    #[test]
    fn rejects_missing_command() {
        let err = Config::from_yaml(
            r#"
actions:
  deploy:
    command: ""
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing required 'command'"));
    }

    #[test]
    fn rejects_unsplittable_command() {
        let err = Config::from_yaml(
            r#"
actions:
  deploy:
    command: "echo \"unmatched"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid command"));
    }

    #[test]
    fn rejects_zero_timeouts() {
        let err = Config::from_yaml("settings:\n  timeout_seconds: 0\n").unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));

        let err = Config::from_yaml(
            r#"
actions:
  slow:
    command: "sleep 1"
    timeout_seconds: 0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("timeout_seconds of 0"));
    }

    #[test]
    fn rejects_zero_max_parallel() {
        let err = Config::from_yaml("settings:\n  max_parallel: 0\n").unwrap_err();
        assert!(err.to_string().contains("max_parallel"));
    }

    #[test]
    fn action_table_contains_builtins_and_configured_actions() {
        let config = Config::from_yaml(
            r#"
actions:
  deploy:
    command: "docker-compose up -d"
"#,
        )
        .unwrap();

        let table = config.action_table().unwrap();
        assert_eq!(table.available(), vec!["Notification", "deploy"]);

        let entry = table.resolve("deploy").unwrap();
        match entry {
            ActionEntry::Command(action) => {
                assert_eq!(action.template.program, "docker-compose");
                assert_eq!(action.template.base_args, vec!["up", "-d"]);
            }
            other => panic!("expected command entry, got {other:?}"),
        }
    }

    #[test]
    fn dispatch_limits_come_from_settings() {
        let config = Config::from_yaml(
            "settings:\n  timeout_seconds: 7\n  capture_limit_kib: 2\n",
        )
        .unwrap();
        let limits = config.dispatch_limits();
        assert_eq!(limits.timeout, Duration::from_secs(7));
        assert_eq!(limits.capture_limit, 2048);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "telegram:\n  bot_token: \"t\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.bot_token().unwrap(), "t");
    }
}
