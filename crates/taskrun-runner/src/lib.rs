//! Shell task execution for taskrun
//!
//! A [`Task`] describes one command: its arguments, working directory, target
//! user, output mode and error policy. A [`Runner`] turns it into a login-shell
//! invocation (wrapped by the elevation tool when another user is targeted),
//! runs it, and reports the outcome through a `Result` plus fire-and-forget
//! callbacks.
//!
//! # Invocation Model
//!
//! All process execution goes through [`CommandSpec`]. The composed shell
//! command travels as one discrete argument to the interpreter, so the only
//! shell parsing happens inside the child shell. Arguments are joined
//! verbatim unless [`Quoting::Posix`] is selected.

pub mod command_spec;
pub mod dispatch;
pub mod error;
pub mod runner;
pub mod shell;
mod stream;
pub mod task;
pub mod types;

pub use command_spec::CommandSpec;
pub use dispatch::Dispatcher;
pub use error::{RunError, TaskError};
pub use runner::{RunSummary, Runner, run};
pub use shell::{ShellSettings, compose_command};
pub use task::{Task, TaskBuilder, TaskOptions};
pub use types::{Callback, LineHandler, LineSource, OsFamily, OutputMode, Quoting, StreamKind};
