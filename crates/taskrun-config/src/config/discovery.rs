use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

use super::{Config, ConfigSource};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV_VAR: &str = "TASKRUN_CONFIG";
/// Directory searched for upward from the working directory.
pub const CONFIG_DIR: &str = ".taskrun";
pub const CONFIG_FILE: &str = "config.toml";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    shell: Option<TomlShell>,
    elevation: Option<TomlElevation>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlShell {
    path: Option<PathBuf>,
    flags: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlElevation {
    tool: Option<String>,
    flags: Option<String>,
    group: Option<String>,
    service_account: Option<String>,
}

impl Config {
    /// Discover and load configuration with precedence:
    /// `explicit` > `$TASKRUN_CONFIG` > upward search from the working
    /// directory > defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let start_dir = env::current_dir().map_err(|e| ConfigError::DiscoveryFailed {
            reason: format!("Failed to get current directory: {e}"),
        })?;

        let from_env = env::var_os(CONFIG_ENV_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Self::discover_from(&start_dir, explicit.map(Path::to_path_buf).or(from_env))
    }

    /// Path-driven variant of [`Config::discover`] that reads no process
    /// state. `explicit` must exist when given.
    pub fn discover_from(start_dir: &Path, explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.is_file() => return Err(ConfigError::NotFound { path }),
            Some(path) => Some(path),
            None => Self::discover_config_file_from(start_dir),
        };

        match path {
            Some(path) => Self::load(&path),
            None => {
                debug!(start_dir = %start_dir.display(), "No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Walk up from `start_dir` looking for `.taskrun/config.toml`, stopping at
    /// a repository root (`.git`, `.hg`, `.svn`) or the filesystem root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        for dir in start_dir.ancestors() {
            let candidate = dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }

            if [".git", ".hg", ".svn"]
                .iter()
                .any(|marker| dir.join(marker).exists())
            {
                break;
            }
        }
        None
    }

    /// Load and validate one configuration file over the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::from_toml_str(&content).map_err(|reason| ConfigError::InvalidFile {
            path: path.to_path_buf(),
            reason,
        })?;
        config.config_path = Some(path.to_path_buf());

        debug!(path = %path.display(), "Loaded configuration file");
        config.validate()?;
        Ok(config)
    }

    /// Apply a TOML document over the defaults, without validating.
    pub(crate) fn from_toml_str(content: &str) -> Result<Self, String> {
        let file: TomlConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        let mut config = Self::default();
        let mut overridden = Vec::new();

        if let Some(shell) = file.shell {
            if let Some(path) = shell.path {
                config.shell.path = path;
                overridden.push("shell.path");
            }
            if let Some(flags) = shell.flags {
                config.shell.flags = flags;
                overridden.push("shell.flags");
            }
        }

        if let Some(elevation) = file.elevation {
            if let Some(tool) = elevation.tool {
                config.elevation.tool = tool;
                overridden.push("elevation.tool");
            }
            if let Some(flags) = elevation.flags {
                config.elevation.flags = flags;
                overridden.push("elevation.flags");
            }
            if let Some(group) = elevation.group {
                config.elevation.group = group;
                overridden.push("elevation.group");
            }
            if let Some(account) = elevation.service_account {
                config.elevation.service_account = account;
                overridden.push("elevation.service_account");
            }
        }

        for key in overridden {
            config
                .source_attribution
                .insert(key.to_string(), ConfigSource::Config);
        }

        Ok(config)
    }
}
