//! Error types for task construction and execution

use taskrun_identity::ProbeError;
use thiserror::Error;

/// Errors raised while configuring a [`Task`](crate::Task).
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("This system ({os}) does not support `sudo` privilege elevation")]
    PlatformUnsupported { os: String },

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("Task command must not be empty")]
    EmptyCommand,

    #[error("Invalid task options: {reason}")]
    InvalidOptions { reason: String },
}

impl TaskError {
    /// Stable identifier for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PlatformUnsupported { .. } => "platform_unsupported",
            Self::Probe(inner) => inner.kind(),
            Self::EmptyCommand => "empty_command",
            Self::InvalidOptions { .. } => "invalid_options",
        }
    }
}

/// Errors returned from [`Runner::run`](crate::Runner::run).
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to start command: {reason}")]
    SpawnFailed { reason: String },

    #[error("Failed to read `{stream}` line: {reason}")]
    StreamReadFailed { stream: String, reason: String },

    #[error("Command failed with {status}")]
    ChildNonZeroExit {
        /// Exit code, `None` when the child was killed by a signal
        code: Option<i32>,
        /// `exit status N` or the signal description
        status: String,
        /// Tail of stderr captured in buffered mode (empty when streaming)
        stderr: String,
    },
}

impl RunError {
    /// Stable identifier for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SpawnFailed { .. } => "spawn_failed",
            Self::StreamReadFailed { .. } => "stream_read_failed",
            Self::ChildNonZeroExit { .. } => "child_non_zero_exit",
        }
    }

    /// Exit code of the child, if the run got as far as an exit.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ChildNonZeroExit { code, .. } => *code,
            _ => None,
        }
    }
}
