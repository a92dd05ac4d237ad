//! Error type for the taskrun CLI and library facade
//!
//! [`TaskrunError`] aggregates the per-crate error enums and maps each one to
//! an [`ExitCode`] and a set of user-facing suggestions.

use std::path::PathBuf;

use thiserror::Error;

use taskrun_config::ConfigError;
use taskrun_identity::ProbeError;
use taskrun_runner::{RunError, TaskError};

use crate::exit_codes::ExitCode;

#[derive(Error, Debug)]
pub enum TaskrunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("{0}")]
    Run(#[from] RunError),

    #[error("Failed to read task file {path}: {reason}")]
    TaskFile { path: PathBuf, reason: String },
}

impl TaskrunError {
    /// Map this error to the CLI exit code.
    ///
    /// A task that exited non-zero propagates its own code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) | Self::TaskFile { .. } => ExitCode::CLI_ARGS,
            Self::Task(_) => ExitCode::TASK_REJECTED,
            Self::Run(RunError::SpawnFailed { .. }) => ExitCode::SPAWN_FAILED,
            Self::Run(RunError::StreamReadFailed { .. }) => ExitCode::STREAM_READ_FAILED,
            Self::Run(RunError::ChildNonZeroExit { code, .. }) => match code {
                Some(code) if *code != 0 => ExitCode::from_i32(*code),
                Some(_) => ExitCode::INTERNAL,
                None => ExitCode::KILLED_BY_SIGNAL,
            },
        }
    }

    /// Suggested actions to resolve the error.
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Task(TaskError::Probe(ProbeError::NotPrivileged { user, group })) => vec![
                format!("Add `{user}` to the `{group}` group, e.g. `usermod -aG {group} {user}`"),
                "Set [elevation] service_account to an account that is in the group".to_string(),
            ],
            Self::Task(TaskError::Probe(ProbeError::UnknownUser { .. })) => {
                vec!["Check the user name passed to --run-as".to_string()]
            }
            Self::Task(TaskError::Probe(ProbeError::ProbeUnavailable { .. })) => {
                vec!["Run `taskrun doctor` to check that whoami and groups are installed".to_string()]
            }
            Self::Task(TaskError::PlatformUnsupported { .. }) => {
                vec!["Run the task without --run-as or --sudo on this platform".to_string()]
            }
            Self::Task(TaskError::EmptyCommand) => {
                vec!["Pass the command after `--`, e.g. `taskrun run -- ls -la`".to_string()]
            }
            Self::Task(TaskError::InvalidOptions { .. }) | Self::TaskFile { .. } => vec![
                "Task files need at least a `command` field".to_string(),
                "Use a .json or .toml extension so the format can be detected".to_string(),
            ],
            Self::Run(RunError::SpawnFailed { .. }) => vec![
                "Check that the configured shell exists (`taskrun doctor`)".to_string(),
            ],
            Self::Run(RunError::StreamReadFailed { .. }) => vec![
                "Use --skip-errors to keep streaming past unreadable lines".to_string(),
            ],
            Self::Run(RunError::ChildNonZeroExit { .. }) => Vec::new(),
        }
    }

    /// Error message followed by suggestions, as printed by the CLI.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = format!("Error: {self}\n");

        if let Self::Run(RunError::ChildNonZeroExit { stderr, .. }) = self
            && !stderr.is_empty()
        {
            output.push_str(&format!("\nStderr:\n{stderr}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }
}
