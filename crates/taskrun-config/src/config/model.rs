use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use taskrun_identity::DEFAULT_ELEVATION_GROUP;
use taskrun_runner::shell::{
    DEFAULT_ELEVATOR, DEFAULT_ELEVATOR_FLAGS, DEFAULT_SHELL, DEFAULT_SHELL_FLAGS,
};

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value loaded from a configuration file.
    Config,
    /// Built-in default value.
    Default,
}

impl ConfigSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[shell]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Absolute path of the login shell
    pub path: PathBuf,
    /// Flags that make the shell read its login profile and run a command string
    pub flags: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SHELL),
            flags: DEFAULT_SHELL_FLAGS.to_string(),
        }
    }
}

/// `[elevation]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElevationConfig {
    /// Elevation tool, looked up on `PATH`
    pub tool: String,
    /// Tool flags; `u <user>` is appended when switching users
    pub flags: String,
    /// Group whose members may use the tool
    pub group: String,
    /// Account checked for group membership; empty checks the invoking user
    pub service_account: String,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            tool: DEFAULT_ELEVATOR.to_string(),
            flags: DEFAULT_ELEVATOR_FLAGS.to_string(),
            group: DEFAULT_ELEVATION_GROUP.to_string(),
            service_account: String::new(),
        }
    }
}

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub shell: ShellConfig,
    pub elevation: ElevationConfig,
    /// File the values were loaded from, `None` for pure defaults
    pub config_path: Option<PathBuf>,
    /// Source of each value, keyed as `section.field`
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Every key reported by [`Config::effective_config`].
pub(crate) const KEYS: [&str; 6] = [
    "shell.path",
    "shell.flags",
    "elevation.tool",
    "elevation.flags",
    "elevation.group",
    "elevation.service_account",
];

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: ShellConfig::default(),
            elevation: ElevationConfig::default(),
            config_path: None,
            source_attribution: KEYS
                .iter()
                .map(|key| ((*key).to_string(), ConfigSource::Default))
                .collect(),
        }
    }
}
