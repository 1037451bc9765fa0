//! Exit codes for the CLI tool.

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Any failed operation, including failed validation
pub const FAILURE: i32 = 1;
/// Ctrl+C (128 + SIGINT)
pub const USER_INTERRUPT: i32 = 130;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Failure,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::Failure => FAILURE,
        }
    }

    /// `Success` if `ok`, `Failure` otherwise.
    pub fn from_outcome(ok: bool) -> Self {
        if ok { Self::Success } else { Self::Failure }
    }
}
