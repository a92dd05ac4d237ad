use std::ffi::OsString;
use std::io;
use std::ops::ControlFlow;
use std::process::{Child, ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, trace, warn};

use crate::command_spec::CommandSpec;
use crate::dispatch::Dispatcher;
use crate::error::RunError;
use crate::shell::ShellSettings;
use crate::stream::{BackgroundLines, for_each_line};
use crate::task::Task;
use crate::types::{Callback, LineHandler, LineSource, OutputMode, StreamKind};

/// Bytes of stderr kept in the error of a failed buffered run.
const STDERR_TAIL_BYTES: usize = 2048;

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Exit code of the child (always 0 for a successful run)
    pub exit_code: i32,
    /// Line read errors that were skipped because the task does not fail on error
    pub skipped_read_errors: usize,
}

// ============================================================================
// Runner
// ============================================================================

/// Executes one [`Task`] and reports how it went.
///
/// `run` blocks until the child exits. Success and failure callbacks are handed
/// to the [`Dispatcher`] and never awaited; exactly one of them is dispatched
/// per run.
///
/// # Example
///
/// ```rust,no_run
/// use taskrun_runner::{Runner, Task};
///
/// let task = Task::builder("echo").arg("hello").build()?;
///
/// Runner::new(&task)
///     .on_success(|| println!("done"))
///     .on_error(|| eprintln!("failed"))
///     .run()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Runner<'a> {
    task: &'a Task,
    on_error: Option<Callback>,
    on_success: Option<Callback>,
    dispatcher: Dispatcher,
    shell: ShellSettings,
}

impl<'a> Runner<'a> {
    #[must_use]
    pub fn new(task: &'a Task) -> Self {
        Self {
            task,
            on_error: None,
            on_success: None,
            dispatcher: Dispatcher::default(),
            shell: ShellSettings::default(),
        }
    }

    /// Notification for a failed run.
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Notification for a successful run.
    #[must_use]
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    #[must_use]
    pub fn shell(mut self, shell: ShellSettings) -> Self {
        self.shell = shell;
        self
    }

    #[must_use]
    pub fn task(&self) -> &Task {
        self.task
    }

    /// The exact invocation `run` will spawn.
    #[must_use]
    pub fn invocation(&self) -> CommandSpec {
        self.shell.invocation(self.task)
    }

    /// Run the task to completion.
    pub fn run(self) -> Result<RunSummary, RunError> {
        let invocation = self.invocation();
        let started = Instant::now();

        debug!(invocation = %invocation, "Assembled task invocation");
        info!(
            command = %self.task.command(),
            run_as = self.task.run_as().unwrap_or(""),
            mode = self.task.output().as_str(),
            "Running task"
        );

        let result = match self.task.output() {
            OutputMode::Buffered => self.run_buffered(&invocation),
            OutputMode::Streaming(handler) => self.run_streaming(&invocation, handler),
        };

        let duration_ms = started.elapsed().as_millis();
        match &result {
            Ok(summary) => {
                info!(
                    exit_code = summary.exit_code,
                    skipped_read_errors = summary.skipped_read_errors,
                    duration_ms = %duration_ms,
                    "Task completed"
                );
                self.notify(self.on_success.as_ref(), "success");
            }
            Err(e) => {
                error!(
                    kind = e.kind(),
                    error = %e,
                    duration_ms = %duration_ms,
                    "Task failed"
                );
                self.notify(self.on_error.as_ref(), "error");
            }
        }

        result
    }

    fn notify(&self, callback: Option<&Callback>, label: &'static str) {
        if let Some(callback) = callback {
            self.dispatcher.dispatch(callback, label);
        }
    }

    // ------------------------------------------------------------------------
    // Buffered mode
    // ------------------------------------------------------------------------

    fn run_buffered(&self, invocation: &CommandSpec) -> Result<RunSummary, RunError> {
        let output = invocation
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| spawn_failed(&invocation.program, &e))?;

        if output.status.success() {
            return Ok(RunSummary {
                exit_code: 0,
                skipped_read_errors: 0,
            });
        }

        Err(exit_failure(output.status, stderr_tail(&output.stderr)))
    }

    // ------------------------------------------------------------------------
    // Streaming mode
    // ------------------------------------------------------------------------

    fn run_streaming(
        &self,
        invocation: &CommandSpec,
        handler: &LineHandler,
    ) -> Result<RunSummary, RunError> {
        let system = |stream: StreamKind, message: &str| handler(stream, message, LineSource::System);
        let fail = |err: RunError| {
            system(StreamKind::Stderr, &err.to_string());
            err
        };

        let mut child = invocation
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| fail(spawn_failed(&invocation.program, &e)))?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            kill_and_reap(&mut child);
            return Err(fail(RunError::SpawnFailed {
                reason: "failed to create output pipes".to_string(),
            }));
        };

        let stderr_lines = match BackgroundLines::spawn(stderr, "taskrun-stderr") {
            Ok(lines) => lines,
            Err(e) => {
                kill_and_reap(&mut child);
                return Err(fail(RunError::SpawnFailed {
                    reason: format!("failed to start stderr reader: {e}"),
                }));
            }
        };

        let mut skipped_read_errors = 0;
        let mut aborted = None;

        for_each_line(stdout, |line| match line {
            Ok(line) => {
                trace!(stream = "stdout", line = %line);
                handler(StreamKind::Stdout, &line, LineSource::Command);
                ControlFlow::Continue(())
            }
            Err(e) => match self.read_failure(handler, StreamKind::Stdout, &e) {
                Some(err) => {
                    aborted = Some(err);
                    ControlFlow::Break(())
                }
                None => {
                    skipped_read_errors += 1;
                    ControlFlow::Continue(())
                }
            },
        });

        if aborted.is_none() {
            for line in stderr_lines.iter() {
                match line {
                    // Blank stderr lines are usually separators; drop them.
                    Ok(line) if line.is_empty() => {}
                    Ok(line) => {
                        trace!(stream = "stderr", line = %line);
                        handler(StreamKind::Stderr, &line, LineSource::Command);
                    }
                    Err(e) => match self.read_failure(handler, StreamKind::Stderr, &e) {
                        Some(err) => {
                            aborted = Some(err);
                            break;
                        }
                        None => skipped_read_errors += 1,
                    },
                }
            }
        }

        if let Some(err) = aborted {
            // The reader thread ends once the killed child's pipe closes.
            kill_and_reap(&mut child);
            return Err(err);
        }
        stderr_lines.join();

        let status = child.wait().map_err(|e| {
            fail(RunError::SpawnFailed {
                reason: format!("failed to wait for command: {e}"),
            })
        })?;

        if !status.success() {
            let err = exit_failure(status, String::new());
            if let RunError::ChildNonZeroExit { status, .. } = &err {
                system(StreamKind::Stderr, status);
            }
            return Err(err);
        }

        system(StreamKind::Stdout, &describe_status(status));
        Ok(RunSummary {
            exit_code: status.code().unwrap_or_default(),
            skipped_read_errors,
        })
    }

    /// Report a line read error through the handler; `Some` means abort.
    fn read_failure(
        &self,
        handler: &LineHandler,
        stream: StreamKind,
        source: &io::Error,
    ) -> Option<RunError> {
        let err = RunError::StreamReadFailed {
            stream: stream.as_str().to_string(),
            reason: source.to_string(),
        };
        handler(StreamKind::Stderr, &err.to_string(), LineSource::System);

        if self.task.fail_on_error() {
            Some(err)
        } else {
            warn!(stream = %stream, error = %source, "Skipping unreadable output line");
            None
        }
    }
}

/// Run `task` with default settings and no callbacks.
pub fn run(task: &Task) -> Result<RunSummary, RunError> {
    Runner::new(task).run()
}

fn spawn_failed(program: &OsString, source: &io::Error) -> RunError {
    RunError::SpawnFailed {
        reason: format!("'{}': {source}", program.to_string_lossy()),
    }
}

fn exit_failure(status: ExitStatus, stderr: String) -> RunError {
    RunError::ChildNonZeroExit {
        code: status.code(),
        status: describe_status(status),
        stderr,
    }
}

/// `exit status N`, or the platform's description when killed by a signal.
fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit status {code}"),
        None => status.to_string(),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim_end();
    if text.len() <= STDERR_TAIL_BYTES {
        return text.to_string();
    }

    let mut start = text.len() - STDERR_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("[truncated] ...{}", &text[start..])
}

fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "Child already exited");
    }
    let _ = child.wait();
}
