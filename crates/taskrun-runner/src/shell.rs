//! Shell command assembly
//!
//! Every task runs as `<shell> <flags> "<composed>"`, optionally wrapped by the
//! elevation tool when it targets another user:
//!
//! ```text
//! sudo -HSu <run_as> /bin/bash -lc "cd <dir> && <command> <args...>"
//! ```

use std::path::PathBuf;

use crate::command_spec::CommandSpec;
use crate::task::Task;
use crate::types::Quoting;

pub const DEFAULT_SHELL: &str = "/bin/bash";
pub const DEFAULT_SHELL_FLAGS: &str = "-lc";
pub const DEFAULT_ELEVATOR: &str = "sudo";
/// `-H` sets the target's HOME, `-S` reads a password from stdin; `-u <user>`
/// is appended when wrapping.
pub const DEFAULT_ELEVATOR_FLAGS: &str = "-HS";

/// Interpreter and elevation tool used to launch tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSettings {
    /// Login shell interpreter
    pub shell: PathBuf,
    /// Flags requesting a login-environment command-string execution
    pub shell_flags: String,
    /// Elevation tool
    pub elevator: String,
    /// Elevation flags, combined with `u` to select the target user
    pub elevator_flags: String,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            shell_flags: DEFAULT_SHELL_FLAGS.to_string(),
            elevator: DEFAULT_ELEVATOR.to_string(),
            elevator_flags: DEFAULT_ELEVATOR_FLAGS.to_string(),
        }
    }
}

impl ShellSettings {
    /// Build the full invocation for `task`.
    ///
    /// Elevation is only applied when the task names a target user that
    /// differs from the invoking user.
    #[must_use]
    pub fn invocation(&self, task: &Task) -> CommandSpec {
        let launcher = match task.run_as() {
            Some(user) if !task.is_same_user() => CommandSpec::new(&self.elevator)
                .arg(self.user_switch_flags())
                .arg(user)
                .arg(self.shell.as_os_str()),
            _ => CommandSpec::new(self.shell.as_os_str()),
        };

        launcher.arg(&self.shell_flags).arg(compose_command(task))
    }

    fn user_switch_flags(&self) -> String {
        match self.elevator_flags.trim() {
            "" => "-u".to_string(),
            flags if flags.starts_with('-') => format!("{flags}u"),
            flags => format!("-{flags}u"),
        }
    }
}

/// The command string handed to the shell: optional `cd <dir>` followed by
/// the command and its arguments, joined with `&&`.
#[must_use]
pub fn compose_command(task: &Task) -> String {
    let quote = |token: &str| -> String {
        match task.quoting() {
            Quoting::Verbatim => token.to_string(),
            Quoting::Posix => shell_words::quote(token).into_owned(),
        }
    };

    let mut steps = Vec::with_capacity(2);
    if let Some(dir) = task.working_dir() {
        steps.push(format!("cd {}", quote(dir)));
    }

    let mut invocation = vec![task.command().to_string()];
    invocation.extend(task.arguments().iter().map(|arg| quote(arg)));
    steps.push(invocation.join(" "));

    steps.join(" && ")
}
