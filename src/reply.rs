//! Reply formatting.
//!
//! Turns a dispatch report into the text sent back to the chat. This is a
//! total function: every outcome variant renders, nothing panics, and
//! failures are visibly labeled so the remote user cannot mistake them for
//! success.

use crate::dispatch::DispatchReport;
use crate::executor::{CapturedOutput, ExecutionOutcome};

/// Chat reply cap. Telegram rejects messages over 4096 characters; this
/// leaves headroom for the code fence and labels.
pub const REPLY_LIMIT: usize = 4000;

const REPLY_TRUNCATION_MARKER: &str = "\n\n[Output truncated - see logs for full result]";
const CAPTURE_TRUNCATION_MARKER: &str = "\n[output truncated]";

/// Render one dispatch report as reply text.
pub fn format_reply(report: &DispatchReport) -> String {
    let action = report.action_label();
    let text = match &report.outcome {
        ExecutionOutcome::Success { output } => {
            if output.is_empty() {
                format!("✅ Action '{action}' completed successfully")
            } else {
                format!(
                    "✅ Action '{action}' completed:\n```\n{}\n```",
                    render_output(output)
                )
            }
        }
        ExecutionOutcome::NonZeroExit { code, output } => failure_with_output(
            format!("❌ Action '{action}' failed with exit code {code}"),
            output,
        ),
        ExecutionOutcome::TimedOut { limit, output } => failure_with_output(
            format!(
                "❌ Action '{action}' timed out after {} seconds",
                limit.as_secs()
            ),
            output,
        ),
        ExecutionOutcome::LaunchFailed { detail } => {
            format!("❌ Action '{action}' could not be started: {detail}")
        }
        ExecutionOutcome::UnknownAction {
            requested,
            available,
            listing,
        } => {
            if listing.is_empty() {
                format!(
                    "Action '{requested}' not found. Available actions: {}",
                    available.join(", ")
                )
            } else {
                format!("Action '{requested}' not found.\n\n{listing}")
            }
        }
        ExecutionOutcome::ParseFailed { detail } => {
            format!("❌ Could not read message: {detail}")
        }
        ExecutionOutcome::BuiltinDone { detail } => {
            format!("✅ Built-in action '{action}' completed: {detail}")
        }
        ExecutionOutcome::BuiltinFailed { detail } => {
            format!("❌ Built-in action '{action}' failed: {detail}")
        }
        ExecutionOutcome::Fault { detail } => {
            format!("❌ Error processing message: {detail}")
        }
    };
    clamp(text)
}

/// Stdout, a truncation note when the capture cap was hit, and stderr under
/// an explicit label when present.
fn render_output(output: &CapturedOutput) -> String {
    let mut body = output.stdout.trim_end().to_string();
    if output.stdout_truncated {
        body.push_str(CAPTURE_TRUNCATION_MARKER);
    }
    if !output.stderr.trim().is_empty() {
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str("Errors:\n");
        body.push_str(output.stderr.trim_end());
        if output.stderr_truncated {
            body.push_str(CAPTURE_TRUNCATION_MARKER);
        }
    }
    body
}

fn failure_with_output(headline: String, output: &CapturedOutput) -> String {
    if output.is_empty() {
        headline
    } else {
        format!("{headline}:\n```\n{}\n```", render_output(output))
    }
}

/// Clamp a reply to the chat limit, marking the cut explicitly.
fn clamp(text: String) -> String {
    if text.chars().count() <= REPLY_LIMIT {
        return text;
    }
    let keep = REPLY_LIMIT - REPLY_TRUNCATION_MARKER.chars().count();
    let mut clamped: String = text.chars().take(keep).collect();
    clamped.push_str(REPLY_TRUNCATION_MARKER);
    clamped
}
