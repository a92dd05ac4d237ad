use std::path::PathBuf;

use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file {path}: {reason}")]
    InvalidFile { path: PathBuf, reason: String },

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: PathBuf },

    #[error("Configuration discovery failed: {reason}")]
    DiscoveryFailed { reason: String },
}

impl ConfigError {
    /// Hints shown next to the error in CLI output.
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile { .. } => vec![
                "Check the TOML syntax of the configuration file".to_string(),
                "Only [shell] and [elevation] sections are recognised".to_string(),
            ],
            Self::InvalidValue { key, .. } => {
                vec![format!("Fix or remove `{key}` to fall back to the default")]
            }
            Self::NotFound { .. } => vec![
                "Pass an existing file to --config or unset TASKRUN_CONFIG".to_string(),
            ],
            Self::DiscoveryFailed { .. } => {
                vec!["Run taskrun from an accessible directory".to_string()]
            }
        }
    }
}
