//! End-to-end tests for task execution
//!
//! Every test spawns a real shell. Exact-output tests use `/bin/sh -c` so that
//! login profiles cannot add lines of their own.

#![cfg(unix)]

use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskrun::{
    Dispatcher, LineHandler, LineSource, RunError, RunSummary, Runner, ShellSettings, StreamKind,
    Task,
};
use tempfile::TempDir;

type Line = (StreamKind, String, LineSource);
type Lines = Arc<Mutex<Vec<Line>>>;

fn sh() -> ShellSettings {
    ShellSettings {
        shell: "/bin/sh".into(),
        shell_flags: "-c".to_string(),
        ..ShellSettings::default()
    }
}

fn collector() -> (Lines, LineHandler) {
    let lines: Lines = Arc::default();
    let sink = Arc::clone(&lines);
    let handler: LineHandler = Arc::new(move |stream: StreamKind, line: &str, source: LineSource| {
        sink.lock().unwrap().push((stream, line.to_string(), source));
    });
    (lines, handler)
}

fn snapshot(lines: &Lines) -> Vec<Line> {
    lines.lock().unwrap().clone()
}

fn command_lines(lines: &[Line], stream: StreamKind) -> Vec<String> {
    lines
        .iter()
        .filter(|(s, _, src)| *s == stream && *src == LineSource::Command)
        .map(|(_, line, _)| line.clone())
        .collect()
}

/// Run `task` with both callbacks attached; returns the result and the one
/// callback that fired.
fn run_observed(
    task: &Task,
    settings: ShellSettings,
) -> (Result<RunSummary, RunError>, &'static str) {
    let (tx, rx) = mpsc::channel();
    let tx_success = tx.clone();

    let result = Runner::new(task)
        .shell(settings)
        .on_success(move || {
            let _ = tx_success.send("success");
        })
        .on_error(move || {
            let _ = tx.send("error");
        })
        .run();

    let fired = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("a callback should fire");
    assert!(
        rx.recv_timeout(Duration::from_millis(200)).is_err(),
        "only one callback may fire per run"
    );
    (result, fired)
}

// ============================================================================
// Streaming mode
// ============================================================================

#[test]
fn test_streaming_success_delivers_lines_then_exit_status() {
    let (lines, handler) = collector();
    let task = Task::builder("printf")
        .arg(r"'first\nsecond\n'")
        .realtime_handler(handler)
        .build()
        .unwrap();

    let (result, fired) = run_observed(&task, sh());

    let summary = result.unwrap();
    assert_eq!(summary.exit_code, 0);
    assert_eq!(summary.skipped_read_errors, 0);
    assert_eq!(fired, "success");
    assert_eq!(
        snapshot(&lines),
        vec![
            (StreamKind::Stdout, "first".to_string(), LineSource::Command),
            (StreamKind::Stdout, "second".to_string(), LineSource::Command),
            (StreamKind::Stdout, "exit status 0".to_string(), LineSource::System),
        ]
    );
}

#[test]
fn test_streaming_non_zero_exit_reports_status_on_stderr() {
    let (lines, handler) = collector();
    let task = Task::builder("echo partial; exit 3")
        .realtime_handler(handler)
        .build()
        .unwrap();

    let (result, fired) = run_observed(&task, sh());

    match result {
        Err(RunError::ChildNonZeroExit { code, status, .. }) => {
            assert_eq!(code, Some(3));
            assert_eq!(status, "exit status 3");
        }
        other => panic!("Expected ChildNonZeroExit, got {other:?}"),
    }
    assert_eq!(fired, "error");

    let lines = snapshot(&lines);
    assert_eq!(command_lines(&lines, StreamKind::Stdout), vec!["partial"]);
    assert_eq!(
        lines.last(),
        Some(&(
            StreamKind::Stderr,
            "exit status 3".to_string(),
            LineSource::System
        ))
    );
}

#[test]
fn test_stdout_lines_precede_stderr_lines() {
    let (lines, handler) = collector();
    let task = Task::builder("echo out1; echo err1 >&2; echo out2; echo err2 >&2")
        .realtime_handler(handler)
        .build()
        .unwrap();

    let (result, _) = run_observed(&task, sh());
    result.unwrap();

    let lines = snapshot(&lines);
    let commands: Vec<&Line> = lines
        .iter()
        .filter(|(_, _, src)| *src == LineSource::Command)
        .collect();
    let first_stderr = commands
        .iter()
        .position(|(s, _, _)| *s == StreamKind::Stderr)
        .unwrap();
    assert!(
        commands[first_stderr..]
            .iter()
            .all(|(s, _, _)| *s == StreamKind::Stderr),
        "stdout lines must all be delivered before stderr lines: {commands:?}"
    );
    assert_eq!(command_lines(&lines, StreamKind::Stdout), vec!["out1", "out2"]);
    assert_eq!(command_lines(&lines, StreamKind::Stderr), vec!["err1", "err2"]);
}

#[test]
fn test_empty_stderr_lines_suppressed_empty_stdout_kept() {
    let (lines, handler) = collector();
    let task = Task::builder(r"printf 'x\n\ny\n'; printf 'e1\n\ne2\n' >&2")
        .realtime_handler(handler)
        .build()
        .unwrap();

    let (result, _) = run_observed(&task, sh());
    result.unwrap();

    let lines = snapshot(&lines);
    assert_eq!(command_lines(&lines, StreamKind::Stdout), vec!["x", "", "y"]);
    assert_eq!(command_lines(&lines, StreamKind::Stderr), vec!["e1", "e2"]);
}

#[test]
fn test_large_stderr_does_not_deadlock() {
    let (lines, handler) = collector();
    // Far more than a pipe buffer on stderr before stdout closes
    let task = Task::builder("i=0; while [ $i -lt 5000 ]; do echo \"stderr line $i\" >&2; i=$((i+1)); done; echo done")
        .realtime_handler(handler)
        .build()
        .unwrap();

    let (result, _) = run_observed(&task, sh());
    result.unwrap();

    let lines = snapshot(&lines);
    assert_eq!(command_lines(&lines, StreamKind::Stdout), vec!["done"]);
    assert_eq!(command_lines(&lines, StreamKind::Stderr).len(), 5000);
}

// ============================================================================
// Read errors
// ============================================================================

#[test]
fn test_read_error_fails_fast_by_default() {
    let (lines, handler) = collector();
    let task = Task::builder("printf")
        .arg(r"'ok\n\377\nafter\n'")
        .realtime_handler(handler)
        .build()
        .unwrap();

    let (result, fired) = run_observed(&task, sh());

    match result {
        Err(RunError::StreamReadFailed { stream, .. }) => assert_eq!(stream, "stdout"),
        other => panic!("Expected StreamReadFailed, got {other:?}"),
    }
    assert_eq!(fired, "error");

    let lines = snapshot(&lines);
    assert_eq!(command_lines(&lines, StreamKind::Stdout), vec!["ok"]);
    let system: Vec<&Line> = lines
        .iter()
        .filter(|(_, _, src)| *src == LineSource::System)
        .collect();
    assert_eq!(system.len(), 1);
    assert_eq!(system[0].0, StreamKind::Stderr);
}

#[test]
fn test_read_error_skipped_when_not_failing_on_error() {
    let (lines, handler) = collector();
    let task = Task::builder("printf")
        .arg(r"'ok\n\377\nafter\n'")
        .skip_errors()
        .realtime_handler(handler)
        .build()
        .unwrap();

    let (result, fired) = run_observed(&task, sh());

    let summary = result.unwrap();
    assert_eq!(summary.skipped_read_errors, 1);
    assert_eq!(fired, "success");

    let lines = snapshot(&lines);
    assert_eq!(command_lines(&lines, StreamKind::Stdout), vec!["ok", "after"]);
    assert!(lines.iter().any(|(s, _, src)| *s == StreamKind::Stderr
        && *src == LineSource::System));
    assert_eq!(
        lines.last(),
        Some(&(
            StreamKind::Stdout,
            "exit status 0".to_string(),
            LineSource::System
        ))
    );
}

// ============================================================================
// Spawn failures
// ============================================================================

#[test]
fn test_spawn_failure_streaming_reports_system_line() {
    let (lines, handler) = collector();
    let task = Task::builder("echo")
        .arg("never")
        .realtime_handler(handler)
        .build()
        .unwrap();
    let settings = ShellSettings {
        shell: "/nonexistent/taskrun-shell".into(),
        ..sh()
    };

    let (result, fired) = run_observed(&task, settings);

    assert!(matches!(result, Err(RunError::SpawnFailed { .. })));
    assert_eq!(fired, "error");

    let lines = snapshot(&lines);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].0, StreamKind::Stderr);
    assert_eq!(lines[0].2, LineSource::System);
    assert!(lines[0].1.contains("taskrun-shell"));
}

#[test]
fn test_spawn_failure_buffered() {
    let task = Task::builder("echo").build().unwrap();
    let settings = ShellSettings {
        shell: "/nonexistent/taskrun-shell".into(),
        ..sh()
    };

    let (result, fired) = run_observed(&task, settings);
    assert!(matches!(result, Err(RunError::SpawnFailed { .. })));
    assert_eq!(fired, "error");
}

// ============================================================================
// Buffered mode
// ============================================================================

#[test]
fn test_buffered_success() {
    let task = Task::builder("echo").arg("quiet").build().unwrap();
    let (result, fired) = run_observed(&task, sh());
    assert_eq!(result.unwrap().exit_code, 0);
    assert_eq!(fired, "success");
}

#[test]
fn test_buffered_failure_keeps_stderr_tail() {
    let task = Task::builder("echo boom >&2; exit 4").build().unwrap();
    let (result, fired) = run_observed(&task, sh());

    match result {
        Err(RunError::ChildNonZeroExit { code, stderr, .. }) => {
            assert_eq!(code, Some(4));
            assert_eq!(stderr, "boom");
        }
        other => panic!("Expected ChildNonZeroExit, got {other:?}"),
    }
    assert_eq!(fired, "error");
}

#[test]
fn test_killed_by_signal_has_no_code() {
    let task = Task::builder("kill -9 $$").build().unwrap();
    let (result, _) = run_observed(&task, sh());

    match result {
        Err(RunError::ChildNonZeroExit { code, status, .. }) => {
            assert_eq!(code, None);
            assert!(status.contains("signal"), "unexpected status {status}");
        }
        other => panic!("Expected ChildNonZeroExit, got {other:?}"),
    }
}

// ============================================================================
// Command assembly
// ============================================================================

#[test]
fn test_working_dir_is_entered() {
    let dir = TempDir::new().unwrap();
    let expected = dir.path().canonicalize().unwrap();

    let (lines, handler) = collector();
    let task = Task::builder("pwd")
        .arg("-P")
        .working_dir(dir.path().to_str().unwrap())
        .realtime_handler(handler)
        .build()
        .unwrap();

    let (result, _) = run_observed(&task, sh());
    result.unwrap();

    let stdout = command_lines(&snapshot(&lines), StreamKind::Stdout);
    assert_eq!(stdout.len(), 1);
    assert_eq!(Path::new(&stdout[0]), expected);
}

#[test]
fn test_missing_working_dir_fails_with_exit_status() {
    let task = Task::builder("pwd")
        .working_dir("/nonexistent/taskrun-dir")
        .build()
        .unwrap();

    let (result, _) = run_observed(&task, sh());
    assert!(matches!(result, Err(RunError::ChildNonZeroExit { .. })));
}

#[test]
fn test_verbatim_arguments_are_shell_parsed() {
    let (lines, handler) = collector();
    let task = Task::builder("printf")
        .arguments([r"'%s\n'", "a b"])
        .realtime_handler(handler)
        .build()
        .unwrap();

    let (result, _) = run_observed(&task, sh());
    result.unwrap();
    assert_eq!(
        command_lines(&snapshot(&lines), StreamKind::Stdout),
        vec!["a", "b"]
    );
}

#[test]
fn test_quoted_arguments_stay_whole() {
    let (lines, handler) = collector();
    let task = Task::builder("printf")
        .arguments([r"%s\n", "a b", "$HOME"])
        .quote_arguments()
        .realtime_handler(handler)
        .build()
        .unwrap();

    let (result, _) = run_observed(&task, sh());
    result.unwrap();
    assert_eq!(
        command_lines(&snapshot(&lines), StreamKind::Stdout),
        vec!["a b", "$HOME"]
    );
}

#[test]
fn test_default_login_shell() {
    if !Path::new("/bin/bash").exists() {
        return;
    }

    let (lines, handler) = collector();
    let task = Task::builder("echo")
        .arg("from-login-shell")
        .realtime_handler(handler)
        .build()
        .unwrap();

    Runner::new(&task).run().unwrap();
    assert!(
        command_lines(&snapshot(&lines), StreamKind::Stdout)
            .contains(&"from-login-shell".to_string())
    );
}

// ============================================================================
// Callback dispatch
// ============================================================================

#[test]
fn test_callbacks_on_tokio_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .build()
        .unwrap();
    let task = Task::builder("true").build().unwrap();
    let (tx, rx) = mpsc::channel();

    Runner::new(&task)
        .shell(sh())
        .dispatcher(Dispatcher::Tokio(runtime.handle().clone()))
        .on_success(move || {
            let _ = tx.send(std::thread::current().name().map(str::to_string));
        })
        .run()
        .unwrap();

    let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_ne!(name.as_deref(), Some("taskrun-success"));
}

#[test]
fn test_run_does_not_wait_for_callbacks() {
    let task = Task::builder("true").build().unwrap();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let (done_tx, done_rx) = mpsc::channel();

    Runner::new(&task)
        .shell(sh())
        .on_success(move || {
            // Blocks until the test lets it go
            let _ = release_rx.lock().unwrap().recv();
            let _ = done_tx.send(());
        })
        .run()
        .unwrap();

    // run() returned while the callback is still blocked
    assert!(done_rx.try_recv().is_err());
    release_tx.send(()).unwrap();
    assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
}
