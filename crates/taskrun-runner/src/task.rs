//! Task description and builder
//!
//! A [`Task`] is produced by [`TaskBuilder::build`] and has no mutators, so a
//! runner holding a reference to it always sees the configuration it was
//! given. Only the target-user steps touch the host, through an
//! [`IdentityProbe`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskrun_identity::IdentityProbe;
use tracing::debug;

use crate::error::TaskError;
use crate::types::{LineHandler, LineSource, OsFamily, OutputMode, Quoting, StreamKind};

// ============================================================================
// Task
// ============================================================================

/// One shell command to run, optionally as another user.
#[derive(Debug, Clone)]
pub struct Task {
    os: &'static str,
    can_sudo: bool,
    running_as: Option<String>,
    run_as: Option<String>,
    output: OutputMode,
    fail_on_error: bool,
    command: String,
    arguments: Vec<String>,
    working_dir: Option<String>,
    quoting: Quoting,
}

impl Task {
    /// Start configuring a task that runs `command`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use taskrun_runner::Task;
    ///
    /// let task = Task::builder("ls")
    ///     .arguments(["-la"])
    ///     .working_dir("/tmp")
    ///     .skip_errors()
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(task.command(), "ls");
    /// assert!(task.has_working_dir());
    /// assert!(!task.fail_on_error());
    /// ```
    #[must_use]
    pub fn builder(command: impl Into<String>) -> TaskBuilder {
        TaskBuilder::new(command)
    }

    /// Build a task from deserialized options.
    ///
    /// A non-empty `run_as` triggers the target-user switch, checking that the
    /// invoking user is in the elevation group.
    pub fn from_options<P>(options: TaskOptions, probe: &P) -> Result<Self, TaskError>
    where
        P: IdentityProbe + ?Sized,
    {
        Self::from_options_as(options, "", probe)
    }

    /// Like [`Task::from_options`], checking `service_account` for elevation
    /// rights instead of the invoking user.
    pub fn from_options_as<P>(
        options: TaskOptions,
        service_account: &str,
        probe: &P,
    ) -> Result<Self, TaskError>
    where
        P: IdentityProbe + ?Sized,
    {
        let run_as = options.run_as.trim().to_string();
        let mut builder = TaskBuilder::from_options(options).service_account(service_account);
        if !run_as.is_empty() {
            builder = builder.run_as(&run_as, probe)?;
        }
        builder.build()
    }

    /// Host OS identifier (`linux`, `macos`, `windows`, ...).
    #[must_use]
    pub fn os(&self) -> &str {
        self.os
    }

    /// Whether privilege elevation is available on this host.
    #[must_use]
    pub fn can_sudo(&self) -> bool {
        self.can_sudo
    }

    /// The invoking user, recorded when a target user was requested.
    #[must_use]
    pub fn running_as(&self) -> Option<&str> {
        self.running_as.as_deref()
    }

    /// Target user, `None` when no elevation was requested.
    #[must_use]
    pub fn run_as(&self) -> Option<&str> {
        self.run_as.as_deref()
    }

    #[must_use]
    pub fn output(&self) -> &OutputMode {
        &self.output
    }

    #[must_use]
    pub fn fail_on_error(&self) -> bool {
        self.fail_on_error
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Working directory, `None` when the command inherits the caller's.
    #[must_use]
    pub fn working_dir(&self) -> Option<&str> {
        self.working_dir.as_deref()
    }

    #[must_use]
    pub fn quoting(&self) -> Quoting {
        self.quoting
    }

    /// True when elevating would not change the user.
    #[must_use]
    pub fn is_same_user(&self) -> bool {
        let running_as = self.running_as.as_deref().unwrap_or_default();
        let run_as = self.run_as.as_deref().unwrap_or_default();
        running_as.trim() == run_as.trim()
    }

    #[must_use]
    pub fn has_working_dir(&self) -> bool {
        self.working_dir
            .as_deref()
            .is_some_and(|dir| !dir.trim().is_empty())
    }
}

// ============================================================================
// TaskBuilder
// ============================================================================

/// Fluent configuration for a [`Task`].
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    os: &'static str,
    os_family: OsFamily,
    running_as: Option<String>,
    run_as: Option<String>,
    output: OutputMode,
    fail_on_error: bool,
    command: String,
    arguments: Vec<String>,
    working_dir: Option<String>,
    quoting: Quoting,
    service_account: String,
}

impl TaskBuilder {
    /// New builder with fail-fast error policy and buffered output.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            os: std::env::consts::OS,
            os_family: OsFamily::host(),
            running_as: None,
            run_as: None,
            output: OutputMode::Buffered,
            fail_on_error: true,
            command: command.into(),
            arguments: Vec::new(),
            working_dir: None,
            quoting: Quoting::Verbatim,
            service_account: String::new(),
        }
    }

    /// Builder carrying everything from `options` except `run_as`.
    #[must_use]
    pub fn from_options(options: TaskOptions) -> Self {
        let quoting = if options.quote_arguments {
            Quoting::Posix
        } else {
            Quoting::Verbatim
        };

        Self::new(options.command)
            .arguments(options.arguments)
            .working_dir(options.working_dir)
            .fail_on_error(options.fail_on_error)
            .quoting(quoting)
    }

    /// Replace the argument vector.
    #[must_use]
    pub fn arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, argument: impl Into<String>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// Directory to `cd` into before running; blank means inherit.
    #[must_use]
    pub fn working_dir(mut self, directory: impl AsRef<str>) -> Self {
        let directory = directory.as_ref().trim();
        self.working_dir = (!directory.is_empty()).then(|| directory.to_string());
        self
    }

    /// Keep streaming after a line read error instead of aborting.
    #[must_use]
    pub fn skip_errors(self) -> Self {
        self.fail_on_error(false)
    }

    #[must_use]
    pub fn fail_on_error(mut self, fail_on_error: bool) -> Self {
        self.fail_on_error = fail_on_error;
        self
    }

    /// Stream output line by line to `handler`.
    #[must_use]
    pub fn realtime_output<F>(self, handler: F) -> Self
    where
        F: Fn(StreamKind, &str, LineSource) + Send + Sync + 'static,
    {
        self.realtime_handler(Arc::new(handler))
    }

    /// Stream output to an already shared handler.
    #[must_use]
    pub fn realtime_handler(mut self, handler: LineHandler) -> Self {
        self.output = OutputMode::Streaming(handler);
        self
    }

    /// POSIX-quote each argument (and the working directory).
    #[must_use]
    pub fn quote_arguments(self) -> Self {
        self.quoting(Quoting::Posix)
    }

    #[must_use]
    pub fn quoting(mut self, quoting: Quoting) -> Self {
        self.quoting = quoting;
        self
    }

    /// Account whose elevation-group membership gates [`run_as`](Self::run_as).
    ///
    /// Empty (the default) checks the invoking user.
    #[must_use]
    pub fn service_account(mut self, account: impl Into<String>) -> Self {
        self.service_account = account.into().trim().to_string();
        self
    }

    /// Run as `username` through the elevation tool.
    ///
    /// The elevation-group check always runs. An empty `username` targets the
    /// invoking user, and a task whose target is the invoking user runs
    /// without the elevation wrapper.
    pub fn run_as<P>(mut self, username: &str, probe: &P) -> Result<Self, TaskError>
    where
        P: IdentityProbe + ?Sized,
    {
        if !self.os_family.supports_elevation() {
            return Err(TaskError::PlatformUnsupported {
                os: self.os.to_string(),
            });
        }

        let running_as = probe.current_username()?;
        let target = match username.trim() {
            "" => running_as.clone(),
            name => name.to_string(),
        };

        probe.ensure_elevation(&self.service_account)?;

        debug!(
            running_as = %running_as,
            run_as = %target,
            service_account = %self.service_account,
            "Elevation configured"
        );

        self.running_as = Some(running_as);
        self.run_as = Some(target);
        Ok(self)
    }

    /// Require elevation rights for the invoking user.
    ///
    /// The target equals the invoking user, so the command itself runs
    /// unwrapped; only the group check gates it.
    pub fn run_as_sudo<P>(self, probe: &P) -> Result<Self, TaskError>
    where
        P: IdentityProbe + ?Sized,
    {
        self.run_as("", probe)
    }

    /// Finish configuration.
    pub fn build(self) -> Result<Task, TaskError> {
        let command = self.command.trim();
        if command.is_empty() {
            return Err(TaskError::EmptyCommand);
        }

        Ok(Task {
            os: self.os,
            can_sudo: self.os_family.supports_elevation(),
            running_as: self.running_as,
            run_as: self.run_as,
            output: self.output,
            fail_on_error: self.fail_on_error,
            command: command.to_string(),
            arguments: self.arguments,
            working_dir: self.working_dir,
            quoting: self.quoting,
        })
    }

    #[cfg(test)]
    pub(crate) fn os_family(mut self, family: OsFamily) -> Self {
        self.os_family = family;
        self
    }
}

// ============================================================================
// TaskOptions - Deserialized Task Configuration
// ============================================================================

/// Serialized task description, as accepted from JSON or TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOptions {
    /// Target user; empty disables elevation
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub run_as: String,
    /// Executable
    pub command: String,
    /// Argument vector
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    /// Working directory; empty inherits
    #[serde(default)]
    pub working_dir: String,
    /// Abort streaming on the first line read error
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fail_on_error: bool,
    /// POSIX-quote arguments instead of joining them verbatim
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub quote_arguments: bool,
}

impl TaskOptions {
    pub fn from_json(input: &str) -> Result<Self, TaskError> {
        serde_json::from_str(input).map_err(|e| TaskError::InvalidOptions {
            reason: e.to_string(),
        })
    }

    pub fn from_toml(input: &str) -> Result<Self, TaskError> {
        toml::from_str(input).map_err(|e| TaskError::InvalidOptions {
            reason: e.to_string(),
        })
    }
}
