//! Configuration for taskrun
//!
//! Hierarchical configuration with discovery: explicit path > `$TASKRUN_CONFIG`
//! > `.taskrun/config.toml` found by upward search > built-in defaults. The
//! TOML file has `[shell]` and `[elevation]` sections.

pub mod config;
pub mod error;

pub use config::{
    CONFIG_DIR, CONFIG_ENV_VAR, CONFIG_FILE, Config, ConfigSource, ElevationConfig, ShellConfig,
};
pub use error::ConfigError;
