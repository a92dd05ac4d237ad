//! Command implementations

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use taskrun_runner::{LineSource, Runner, StreamKind, TaskBuilder, TaskOptions};
use tracing::warn;

use super::args::RunArgs;
use crate::doctor::{self, CheckStatus};
use crate::{Config, ExitCode, TaskrunError};

// ============================================================================
// Run Command
// ============================================================================

/// Build a task from the arguments (or a task file) and run it.
pub fn execute_run_command(args: RunArgs, config: &Config) -> Result<ExitCode> {
    let from_file = args.task.is_some();
    let mut options = match &args.task {
        Some(path) => load_task_file(path)?,
        None => inline_options(&args.command),
    };

    // Flags override the task file
    if let Some(cwd) = &args.cwd {
        options.working_dir = cwd.clone();
    }
    if let Some(user) = &args.run_as {
        options.run_as = user.clone();
    }
    if args.quote {
        options.quote_arguments = true;
    }

    // Inline tasks fail fast unless told otherwise; task files say so themselves
    let fail_on_error = !args.skip_errors && (!from_file || options.fail_on_error);
    let run_as = options.run_as.trim().to_string();

    let mut builder = TaskBuilder::from_options(options)
        .fail_on_error(fail_on_error)
        .service_account(config.service_account());

    if args.stream {
        builder = builder.realtime_output(print_line);
    }

    let probe = config.identity_probe();
    if args.sudo {
        builder = builder.run_as_sudo(&probe).map_err(TaskrunError::from)?;
    } else if !run_as.is_empty() {
        builder = builder.run_as(&run_as, &probe).map_err(TaskrunError::from)?;
    }

    let task = builder.build().map_err(TaskrunError::from)?;

    let summary = Runner::new(&task)
        .shell(config.shell_settings())
        .run()
        .map_err(TaskrunError::from)?;

    if summary.skipped_read_errors > 0 {
        warn!(
            skipped = summary.skipped_read_errors,
            "Some output lines could not be read"
        );
    }

    Ok(ExitCode::SUCCESS)
}

fn inline_options(command: &[String]) -> TaskOptions {
    let (command, arguments) = match command.split_first() {
        Some((command, arguments)) => (command.clone(), arguments.to_vec()),
        None => (String::new(), Vec::new()),
    };

    TaskOptions {
        command,
        arguments,
        ..TaskOptions::default()
    }
}

/// Read a task file; `.toml` files are TOML, anything else JSON.
fn load_task_file(path: &Path) -> Result<TaskOptions, TaskrunError> {
    let content = std::fs::read_to_string(path).map_err(|e| TaskrunError::TaskFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let options = if is_toml {
        TaskOptions::from_toml(&content)?
    } else {
        TaskOptions::from_json(&content)?
    };
    Ok(options)
}

/// Command lines go to the matching stream, runner lines to stderr with a prefix.
fn print_line(stream: StreamKind, line: &str, source: LineSource) {
    // Write errors (closed pipe) are ignored; the task keeps running
    let _ = match (source, stream) {
        (LineSource::Command, StreamKind::Stdout) => writeln!(std::io::stdout().lock(), "{line}"),
        (LineSource::Command, StreamKind::Stderr) => writeln!(std::io::stderr().lock(), "{line}"),
        (LineSource::System, _) => writeln!(std::io::stderr().lock(), "taskrun: {line}"),
    };
}

// ============================================================================
// Doctor Command
// ============================================================================

pub fn execute_doctor_command(json: bool, config: &Config) -> Result<ExitCode> {
    let probe = config.identity_probe();
    let output = doctor::run_checks(config, &probe);

    if json {
        let json_output =
            serde_json::to_string_pretty(&output).context("Failed to emit doctor JSON")?;
        println!("{json_output}");
    } else {
        println!("taskrun doctor");
        println!();
        for check in &output.checks {
            println!(
                "  {} {:<18} {}",
                check.status.symbol(),
                check.name,
                check.details
            );
        }

        let warnings = output
            .checks
            .iter()
            .filter(|c| c.status == CheckStatus::Warn)
            .count();
        println!();
        if output.ok {
            println!("All required checks passed ({warnings} warning(s)).");
        } else {
            println!("Some checks failed. Please address the issues above before running tasks.");
        }
    }

    // Exit with non-zero code if any check failed
    Ok(if output.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::INTERNAL
    })
}

// ============================================================================
// Config Command
// ============================================================================

pub fn execute_config_command(config: &Config) -> Result<ExitCode> {
    println!("Effective configuration:");
    match &config.config_path {
        Some(path) => println!("  file: {}", path.display()),
        None => println!("  file: (none, using defaults)"),
    }
    println!();

    for (key, (value, source)) in config.effective_config() {
        let value = if value.is_empty() { "\"\"" } else { value.as_str() };
        println!("  {key} = {value}  [{source}]");
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_inline_options_split_command() {
        let options = inline_options(&["ls".to_string(), "-la".to_string()]);
        assert_eq!(options.command, "ls");
        assert_eq!(options.arguments, vec!["-la"]);

        let options = inline_options(&[]);
        assert!(options.command.is_empty());
    }

    #[test]
    fn test_load_task_file_by_extension() {
        let dir = TempDir::new().unwrap();

        let toml_path = dir.path().join("task.toml");
        fs::write(&toml_path, "command = \"echo\"\narguments = [\"hi\"]\n").unwrap();
        let options = load_task_file(&toml_path).unwrap();
        assert_eq!(options.command, "echo");
        assert_eq!(options.arguments, vec!["hi"]);

        let json_path = dir.path().join("task.json");
        fs::write(&json_path, r#"{"command": "pwd", "working_dir": "/tmp"}"#).unwrap();
        let options = load_task_file(&json_path).unwrap();
        assert_eq!(options.working_dir, "/tmp");
    }

    #[test]
    fn test_load_task_file_missing() {
        let dir = TempDir::new().unwrap();
        let err = load_task_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, TaskrunError::TaskFile { .. }));
        assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);
    }
}
