//! Configuration management for taskrun
//!
//! Supports a TOML configuration file with `[shell]` and `[elevation]`
//! sections:
//!
//! ```toml
//! [shell]
//! path = "/bin/bash"
//! flags = "-lc"
//!
//! [elevation]
//! tool = "sudo"
//! flags = "-HS"
//! group = "sudo"
//! service_account = ""
//! ```

mod discovery;
mod model;
mod sources;
mod validation;

pub use discovery::{CONFIG_DIR, CONFIG_ENV_VAR, CONFIG_FILE};
pub use model::*;

use taskrun_identity::SystemProbe;
use taskrun_runner::ShellSettings;

impl Config {
    /// Shell and elevation settings for a [`Runner`](taskrun_runner::Runner).
    #[must_use]
    pub fn shell_settings(&self) -> ShellSettings {
        ShellSettings {
            shell: self.shell.path.clone(),
            shell_flags: self.shell.flags.trim().to_string(),
            elevator: self.elevation.tool.trim().to_string(),
            elevator_flags: self.elevation.flags.trim().to_string(),
        }
    }

    /// Host probe checking membership of the configured elevation group.
    #[must_use]
    pub fn identity_probe(&self) -> SystemProbe {
        SystemProbe::with_group(self.elevation.group.trim())
    }

    /// Account whose group membership gates elevation; empty means the
    /// invoking user.
    #[must_use]
    pub fn service_account(&self) -> &str {
        self.elevation.service_account.trim()
    }
}
