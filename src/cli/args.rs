//! CLI argument definitions and parsing structures

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// taskrun - run shell tasks as another user
#[derive(Parser, Debug)]
#[command(name = "taskrun")]
#[command(about = "Run a shell task, optionally as another user, with streamed output")]
#[command(long_about = r#"
taskrun runs one shell command through a login shell, optionally switching to
another user with the elevation tool, and reports how it went.

EXAMPLES:
  # Run a command and stream its output line by line
  taskrun run --stream -- ls -la /var/log

  # Run in a working directory as another user
  taskrun run --stream --cwd /srv/app --run-as deploy -- git pull

  # Run a task described in a file
  taskrun run --task deploy.toml --stream

  # Check that the host can run tasks
  taskrun doctor --json

CONFIGURATION:
  Configuration is loaded with precedence: --config > $TASKRUN_CONFIG >
  .taskrun/config.toml (searched upward from CWD) > defaults.
  Use `taskrun config` to print the effective values.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a task
    Run(RunArgs),

    /// Check the environment for shell, elevation tool, and group membership
    Doctor {
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration with the source of each value
    Config,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Load the task from a JSON or TOML file
    #[arg(long, value_name = "FILE", conflicts_with = "command")]
    pub task: Option<PathBuf>,

    /// Directory to change into before running the command
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<String>,

    /// Run the command as USER through the elevation tool
    #[arg(long, value_name = "USER", conflicts_with = "sudo")]
    pub run_as: Option<String>,

    /// Check elevation-group membership, then run unwrapped as the invoking user
    #[arg(long)]
    pub sudo: bool,

    /// Print output line by line while the command runs
    #[arg(long)]
    pub stream: bool,

    /// Keep streaming after an unreadable output line
    #[arg(long)]
    pub skip_errors: bool,

    /// Quote each argument for the shell instead of passing it verbatim
    #[arg(long)]
    pub quote: bool,

    /// Command and arguments, after `--`
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}
