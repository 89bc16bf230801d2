//! Error types for the opsrelay CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error
//! messages. Note that dispatch-path failures (bad message, unknown action,
//! failed command) are not errors in this sense: they are converted into
//! reply text and sent back to the chat. `RelayError` covers the faults that
//! prevent the dispatcher from running at all.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for opsrelay operations.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration file problem or bad CLI usage.
    #[error("{0}")]
    Config(String),

    /// Telegram Bot API request failed.
    #[error("Telegram request failed: {0}")]
    Telegram(String),

    /// The dispatch pool is unavailable (shut down or failed to start).
    #[error("{0}")]
    Dispatch(String),
}

impl RelayError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RelayError::Config(_) => exit_codes::USER_ERROR,
            RelayError::Dispatch(_) => exit_codes::USER_ERROR,
            RelayError::Telegram(_) => exit_codes::TELEGRAM_FAILURE,
        }
    }
}

/// Result type alias for opsrelay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
