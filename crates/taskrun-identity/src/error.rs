//! Error types for identity probing

use thiserror::Error;

/// Failures reported while resolving the invoking user or checking whether an
/// account may use the elevation tool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Identity lookup failed: {reason}")]
    ProbeUnavailable { reason: String },

    #[error("User `{user}` could not be found")]
    UnknownUser { user: String },

    #[error("User `{user}` is not in the `{group}` group")]
    NotPrivileged { user: String, group: String },
}

impl ProbeError {
    /// Stable identifier for the error kind, used in logs and CLI output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ProbeUnavailable { .. } => "probe_unavailable",
            Self::UnknownUser { .. } => "unknown_user",
            Self::NotPrivileged { .. } => "not_privileged",
        }
    }
}
