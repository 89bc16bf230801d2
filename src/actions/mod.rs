//! Action table and resolution.
//!
//! An action maps a chat-message section name to either an external command
//! template (custom actions, configured by the user) or a built-in handler
//! (system-provided actions). Names starting with an uppercase letter are
//! reserved for built-ins by convention; resolution itself is a plain exact,
//! case-sensitive lookup for both kinds.
//!
//! The table is immutable once built. Reloads install a whole new table
//! atomically (see `pool::SharedTable`), so in-flight dispatches keep the
//! snapshot they started with.

mod builtins;


pub use builtins::BuiltinAction;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// An executable plus its fixed leading arguments, split once at
/// configuration-load time. Message-derived flags are appended as discrete
/// argv elements later; the command string is never re-split with
/// message-controlled data.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandTemplate {
    pub program: String,
    pub base_args: Vec<String>,
}

/// Problems turning a configured command string into a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("command could not be split: {0}")]
    Split(#[from] shell_words::ParseError),

    #[error("command is empty")]
    Empty,
}

impl CommandTemplate {
    /// Split a configured command string on shell-style word boundaries.
    pub fn parse(command: &str) -> Result<Self, TemplateError> {
        let mut tokens = shell_words::split(command)?;
        if tokens.is_empty() {
            return Err(TemplateError::Empty);
        }
        let program = tokens.remove(0);
        Ok(Self {
            program,
            base_args: tokens,
        })
    }

    /// Build the full argv for this template plus translated flags.
    pub fn argv(&self, flags: Vec<String>) -> Vec<String> {
        let mut argv = Vec::with_capacity(1 + self.base_args.len() + flags.len());
        argv.push(self.program.clone());
        argv.extend(self.base_args.iter().cloned());
        argv.extend(flags);
        argv
    }
}

/// One configured custom action.
#[derive(Debug, Clone)]
pub struct ActionDefinition {
    pub name: String,
    pub template: CommandTemplate,
    pub description: Option<String>,
    /// Working directory for the command; the process's own working
    /// directory is used when unset.
    pub working_dir: Option<PathBuf>,
    /// Per-action timeout override; the global setting applies when unset.
    pub timeout: Option<Duration>,
}

/// A resolvable table entry: external command or built-in handler.
#[derive(Debug, Clone)]
pub enum ActionEntry {
    Command(ActionDefinition),
    Builtin(BuiltinAction),
}

impl ActionEntry {
    pub fn name(&self) -> &str {
        match self {
            ActionEntry::Command(action) => &action.name,
            ActionEntry::Builtin(builtin) => builtin.name,
        }
    }
}

/// True if the name falls in the built-in namespace (leading uppercase).
pub fn is_builtin_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Read-only collection of all available actions, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    entries: BTreeMap<String, ActionEntry>,
}

impl ActionTable {
    /// An empty table with the built-in actions pre-registered.
    pub fn with_builtins() -> Self {
        let mut table = Self::default();
        for builtin in builtins::all() {
            table.insert(ActionEntry::Builtin(builtin));
        }
        table
    }

    pub fn insert(&mut self, entry: ActionEntry) {
        self.entries.insert(entry.name().to_string(), entry);
    }

    /// Exact, case-sensitive lookup. No fuzzy or prefix matching.
    pub fn resolve(&self, name: &str) -> Option<&ActionEntry> {
        self.entries.get(name)
    }

    /// All action names, built-in and custom combined, sorted.
    pub fn available(&self) -> Vec<String> {
        // BTreeMap iteration is already in sorted key order.
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Human-readable listing of every action, grouped into built-in and
    /// custom sections. Used in unknown-action replies and by the
    /// `actions` subcommand.
    pub fn listing(&self) -> String {
        let mut built_in = Vec::new();
        let mut custom = Vec::new();

        for entry in self.entries.values() {
            match entry {
                ActionEntry::Builtin(builtin) => built_in.push(builtin.describe()),
                ActionEntry::Command(action) => {
                    let description = action.description.as_deref().unwrap_or("No description");
                    custom.push(format!("• **{}**: {}", action.name, description));
                }
            }
        }

        let built_in_block = if built_in.is_empty() {
            "No built-in actions available.".to_string()
        } else {
            format!("Built-in actions:\n{}", built_in.join("\n"))
        };
        let custom_block = if custom.is_empty() {
            "No custom actions are currently configured.".to_string()
        } else {
            format!("Custom actions:\n{}", custom.join("\n"))
        };

        format!("{built_in_block}\n\n{custom_block}")
    }
}
