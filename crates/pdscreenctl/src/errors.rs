//! Exit codes for pdscreenctl

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when the daemon rejected the input (HTTP 4xx)
pub const EXIT_INVALID_INPUT: i32 = 65;

/// Exit code when the daemon failed to predict (HTTP 5xx)
pub const EXIT_PREDICTION_FAILED: i32 = 69;

/// Exit code when the daemon is unavailable/unreachable
pub const EXIT_DAEMON_UNAVAILABLE: i32 = 70;

/// Map a rejected HTTP status to an exit code
pub fn exit_code_for_status(status: u16) -> i32 {
    match status {
        400..=499 => EXIT_INVALID_INPUT,
        500..=599 => EXIT_PREDICTION_FAILED,
        _ => EXIT_GENERAL_ERROR,
    }
}
