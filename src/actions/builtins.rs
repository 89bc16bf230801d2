//! Built-in actions.
//!
//! Built-ins are system-provided behaviors dispatched in-process instead of
//! through an external command. Their names start with an uppercase letter;
//! that namespace is rejected for user-configured actions at load time.

use crate::message::Scalar;
use tracing::info;

type Handler = fn(&[(String, Scalar)]) -> Result<String, String>;

/// One built-in action with its parameter contract and handler.
#[derive(Debug, Clone)]
pub struct BuiltinAction {
    pub name: &'static str,
    pub description: &'static str,
    pub required_params: &'static [&'static str],
    pub optional_params: &'static [&'static str],
    handler: Handler,
}

impl BuiltinAction {
    /// Validate required parameters, then run the handler.
    pub fn invoke(&self, parameters: &[(String, Scalar)]) -> Result<String, String> {
        for required in self.required_params {
            if !parameters.iter().any(|(key, _)| key == required) {
                return Err(format!(
                    "built-in action '{}' requires parameter '{}'",
                    self.name, required
                ));
            }
        }
        (self.handler)(parameters)
    }

    /// One listing line including the parameter contract.
    pub fn describe(&self) -> String {
        let mut line = format!("• **{}**: {}", self.name, self.description);
        if !self.required_params.is_empty() {
            line.push_str(&format!(" (Required: {})", self.required_params.join(", ")));
        }
        if !self.optional_params.is_empty() {
            line.push_str(&format!(" (Optional: {})", self.optional_params.join(", ")));
        }
        line
    }
}

/// All built-in actions, to be seeded into every action table.
pub fn all() -> Vec<BuiltinAction> {
    vec![BuiltinAction {
        name: "Notification",
        description: "Show a system notification with message and optional title",
        required_params: &["message"],
        optional_params: &["title"],
        handler: notification,
    }]
}

fn param<'a>(parameters: &'a [(String, Scalar)], key: &str) -> Option<&'a Scalar> {
    parameters
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, value)| value)
}

fn notification(parameters: &[(String, Scalar)]) -> Result<String, String> {
    let message = param(parameters, "message")
        .map(ToString::to_string)
        .ok_or_else(|| "Notification action requires 'message' parameter".to_string())?;
    let title = param(parameters, "title")
        .map(ToString::to_string)
        .unwrap_or_else(|| "Ops Relay".to_string());

    info!(%title, %message, "notification");
    Ok(format!("Notification shown: {title} - {message}"))
}
