use std::ffi::OsString;
use std::fmt;
use std::process::Command;

// ============================================================================
// CommandSpec - Assembled Process Invocation
// ============================================================================

/// The exact program and argv the runner will spawn.
///
/// A task is always turned into one of these before anything is started, so
/// the invocation can be inspected (and logged) without running it. The shell
/// command string travels as a single discrete argument.
///
/// # Example
///
/// ```rust
/// use taskrun_runner::CommandSpec;
/// use std::ffi::OsString;
///
/// let cmd = CommandSpec::new("/bin/bash")
///     .arg("-lc")
///     .arg("echo hello");
///
/// assert_eq!(cmd.program, OsString::from("/bin/bash"));
/// assert_eq!(cmd.args.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to execute
    pub program: OsString,
    /// Arguments as discrete elements
    pub args: Vec<OsString>,
}

impl CommandSpec {
    /// Create a new `CommandSpec` with the given program.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add a single argument to the command.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments to the command.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Whether `program` or any argument equals `token` exactly.
    #[must_use]
    pub fn mentions(&self, token: &str) -> bool {
        self.program == token || self.args.iter().any(|arg| arg == token)
    }

    /// The last argument, which for shell invocations is the command string.
    #[must_use]
    pub fn script(&self) -> Option<&OsString> {
        self.args.last()
    }

    /// Convert this `CommandSpec` into a `std::process::Command`.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", shell_words::quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}
