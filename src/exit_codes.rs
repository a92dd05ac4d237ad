//! Exit codes for the taskrun CLI.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Task completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `TASK_REJECTED` | Task could not be configured (platform, user, group) |
//! | 4 | `SPAWN_FAILED` | The shell could not be started |
//! | 5 | `STREAM_READ_FAILED` | An output line could not be read in fail-fast mode |
//! | 6 | `KILLED_BY_SIGNAL` | The task was terminated by a signal |
//!
//! A task that exits non-zero propagates its own exit code.

/// Process exit code.
///
/// # Example
///
/// ```rust
/// use taskrun::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::SPAWN_FAILED, ExitCode::from_i32(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// Invalid or missing command-line arguments, or bad configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Unsupported platform, unresolvable user, or missing elevation rights
    pub const TASK_REJECTED: ExitCode = ExitCode(3);

    pub const SPAWN_FAILED: ExitCode = ExitCode(4);

    pub const STREAM_READ_FAILED: ExitCode = ExitCode(5);

    /// The task exited without a code
    pub const KILLED_BY_SIGNAL: ExitCode = ExitCode(6);

    /// Get the numeric exit code value.
    ///
    /// Use this with `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    ///
    /// Prefer using the named constants when possible.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_constants() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::TASK_REJECTED.as_i32(), 3);
        assert_eq!(ExitCode::SPAWN_FAILED.as_i32(), 4);
        assert_eq!(ExitCode::STREAM_READ_FAILED.as_i32(), 5);
        assert_eq!(ExitCode::KILLED_BY_SIGNAL.as_i32(), 6);
    }

    #[test]
    fn test_exit_code_conversions() {
        assert_eq!(ExitCode::from(42), ExitCode::from_i32(42));
        assert_eq!(i32::from(ExitCode::TASK_REJECTED), 3);
        assert!(ExitCode::SUCCESS.is_success());
        assert!(!ExitCode::from_i32(42).is_success());
    }
}
