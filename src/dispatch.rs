//! End-to-end message dispatch.
//!
//! One incoming message flows parse -> resolve -> translate -> execute and
//! produces exactly one outcome, which the reply module renders into text.
//! No state survives a dispatch: the action table snapshot is borrowed, the
//! parsed message and execution request are dropped when the report is
//! built.
//!
//! A single malformed or failing message must never take the dispatcher
//! down, so `dispatch_reply` also catches panics from the pipeline and
//! answers with a generic failure instead of going silent.

use crate::actions::{ActionEntry, ActionTable};
use crate::executor::{self, DEFAULT_CAPTURE_LIMIT, ExecutionOutcome, ExecutionRequest};
use crate::message;
use crate::reply;
use crate::translate;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;
use tracing::{error, info};

/// Per-dispatch limits shared by every action unless overridden.
#[derive(Debug, Clone)]
pub struct DispatchLimits {
    pub timeout: Duration,
    pub capture_limit: usize,
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            capture_limit: DEFAULT_CAPTURE_LIMIT,
        }
    }
}

/// The terminal value of one dispatch: which action was addressed (when the
/// message parsed far enough to know) and what happened.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub action: Option<String>,
    pub outcome: ExecutionOutcome,
}

impl DispatchReport {
    pub fn action_label(&self) -> &str {
        self.action.as_deref().unwrap_or("<unknown>")
    }
}

/// Dispatch one raw message against an action table snapshot.
pub fn dispatch(table: &ActionTable, limits: &DispatchLimits, raw: &str) -> DispatchReport {
    let parsed = match message::parse_message(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            return DispatchReport {
                action: None,
                outcome: ExecutionOutcome::ParseFailed {
                    detail: e.to_string(),
                },
            };
        }
    };

    let Some(entry) = table.resolve(&parsed.action) else {
        info!(action = %parsed.action, "unknown action requested");
        return DispatchReport {
            action: Some(parsed.action.clone()),
            outcome: ExecutionOutcome::UnknownAction {
                requested: parsed.action,
                available: table.available(),
                listing: table.listing(),
            },
        };
    };

    let outcome = match entry {
        ActionEntry::Builtin(builtin) => {
            info!(action = builtin.name, "running built-in action");
            match builtin.invoke(&parsed.parameters) {
                Ok(detail) => ExecutionOutcome::BuiltinDone { detail },
                Err(detail) => ExecutionOutcome::BuiltinFailed { detail },
            }
        }
        ActionEntry::Command(action) => {
            let flags = translate::translate(&parsed.parameters);
            let request = ExecutionRequest {
                argv: action.template.argv(flags),
                working_dir: action.working_dir.clone(),
                timeout: action.timeout.unwrap_or(limits.timeout),
                capture_limit: limits.capture_limit,
            };
            info!(action = %action.name, argv = ?request.argv, "executing action");
            executor::execute(&request)
        }
    };

    DispatchReport {
        action: Some(parsed.action),
        outcome,
    }
}

/// Dispatch one message and render the reply, absorbing internal faults.
///
/// Silence is indistinguishable from message loss to the remote user, so
/// even a bug in the pipeline still produces a generic failure reply.
pub fn dispatch_reply(table: &ActionTable, limits: &DispatchLimits, raw: &str) -> String {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let report = dispatch(table, limits, raw);
        reply::format_reply(&report)
    }));

    match result {
        Ok(text) => text,
        Err(_) => {
            error!("dispatch panicked; sending generic failure reply");
            reply::format_reply(&DispatchReport {
                action: None,
                outcome: ExecutionOutcome::Fault {
                    detail: "unexpected internal error while processing the message".to_string(),
                },
            })
        }
    }
}
