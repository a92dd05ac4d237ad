//! taskrun - run shell tasks as another user with streamed output
//!
//! taskrun runs a single shell command through a login shell, optionally
//! switching to another user with the elevation tool (`sudo`), and reports the
//! outcome. Output can be buffered or delivered line by line as it is produced.
//!
//! taskrun can be used in two ways:
//! - **CLI**: `taskrun run --stream -- ls -la`
//! - **Library**: build a [`Task`] and run it with a [`Runner`]
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use taskrun::{LineSource, Runner, StreamKind, SystemProbe, Task};
//!
//! let task = Task::builder("ls")
//!     .arguments(["-la"])
//!     .working_dir("/var/log")
//!     .realtime_output(|stream: StreamKind, line: &str, source: LineSource| {
//!         println!("[{stream}/{source:?}] {line}");
//!     })
//!     .run_as("deploy", &SystemProbe::new())?
//!     .build()?;
//!
//! Runner::new(&task)
//!     .on_success(|| println!("done"))
//!     .on_error(|| eprintln!("failed"))
//!     .run()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Crates
//!
//! - `taskrun-identity`: invoking-user and elevation-group probes
//! - `taskrun-runner`: tasks, command assembly, and execution
//! - `taskrun-config`: configuration discovery and validation

pub mod cli;
pub mod doctor;
pub mod error;
pub mod exit_codes;
pub mod logging;

pub use error::TaskrunError;
pub use exit_codes::ExitCode;

pub use taskrun_config::{Config, ConfigError, ConfigSource};
pub use taskrun_identity::{IdentityProbe, ProbeError, SystemProbe};
pub use taskrun_runner::{
    CommandSpec, Dispatcher, LineHandler, LineSource, OutputMode, Quoting, RunError, RunSummary,
    Runner, ShellSettings, StreamKind, Task, TaskBuilder, TaskError, TaskOptions,
};
