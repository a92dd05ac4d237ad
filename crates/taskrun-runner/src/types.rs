//! Types shared by tasks and runners

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which pipe of the child a streamed line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub const STDOUT: i32 = 1;
    pub const STDERR: i32 = 2;

    /// Numeric code handed to integer-based consumers (`STDOUT=1`, `STDERR=2`).
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Stdout => Self::STDOUT,
            Self::Stderr => Self::STDERR,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced a streamed line: the child process or the runner itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSource {
    /// Synthetic lines: setup errors, read errors, the final exit status.
    System,
    /// Lines read from the child's pipes.
    Command,
}

impl LineSource {
    pub const SYSTEM: i32 = 1;
    pub const COMMAND: i32 = 2;

    /// Numeric code handed to integer-based consumers (`SYSTEM=1`, `COMMAND=2`).
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::System => Self::SYSTEM,
            Self::Command => Self::COMMAND,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Command => "command",
        }
    }
}

impl fmt::Display for LineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line callback used in streaming mode.
///
/// Invoked on the thread that called [`Runner::run`](crate::Runner::run). It is
/// `Send + Sync` so one handler can be shared by runners on several threads.
pub type LineHandler = Arc<dyn Fn(StreamKind, &str, LineSource) + Send + Sync>;

/// Completion notification, dispatched without being awaited.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// How the runner collects the child's output.
#[derive(Clone, Default)]
pub enum OutputMode {
    /// Run to completion; nothing is delivered to the caller.
    #[default]
    Buffered,
    /// Deliver every line to the handler as it is read.
    Streaming(LineHandler),
}

impl OutputMode {
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming(_))
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buffered => "buffered",
            Self::Streaming(_) => "streaming",
        }
    }
}

impl fmt::Debug for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered => f.write_str("Buffered"),
            Self::Streaming(_) => f.write_str("Streaming(<handler>)"),
        }
    }
}

/// How argument tokens are joined into the shell command string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quoting {
    /// Joined with single spaces as given; escaping is the caller's job.
    #[default]
    Verbatim,
    /// Each argument is POSIX-quoted before joining.
    Posix,
}

/// Host operating-system family, detected once when a task is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Unix,
    Windows,
    Other,
}

impl OsFamily {
    /// Family of the host this binary was built for.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(unix) {
            Self::Unix
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Other
        }
    }

    /// Whether the elevation tool can be used on this family.
    #[must_use]
    pub const fn supports_elevation(self) -> bool {
        matches!(self, Self::Unix)
    }
}
