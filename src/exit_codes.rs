//! Exit code constants for the opsrelay CLI.
//!
//! - 0: Success
//! - 1: User error (bad arguments, invalid configuration)
//! - 2: Telegram transport failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// Telegram transport failure: the Bot API could not be reached or rejected us.
pub const TELEGRAM_FAILURE: i32 = 2;
