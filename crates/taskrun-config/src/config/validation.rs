use crate::error::ConfigError;

use super::Config;

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

impl Config {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // The shell is spawned directly, so it must not depend on PATH
        if !self.shell.path.is_absolute() {
            return Err(invalid(
                "shell.path",
                &format!("{} must be an absolute path", self.shell.path.display()),
            ));
        }

        if self.shell.flags.trim().is_empty() {
            return Err(invalid("shell.flags", "must not be empty"));
        }

        if self.shell.flags.split_whitespace().count() > 1 {
            return Err(invalid(
                "shell.flags",
                "must be a single argument such as -lc",
            ));
        }

        if self.elevation.tool.trim().is_empty() {
            return Err(invalid("elevation.tool", "must not be empty"));
        }

        if self.elevation.flags.trim().chars().any(char::is_whitespace) {
            return Err(invalid(
                "elevation.flags",
                "must be a single flag cluster such as -HS",
            ));
        }

        if self.elevation.group.trim().is_empty() {
            return Err(invalid("elevation.group", "must not be empty"));
        }

        if self.elevation.service_account.trim().chars().any(char::is_whitespace) {
            return Err(invalid(
                "elevation.service_account",
                "must not contain whitespace",
            ));
        }

        Ok(())
    }
}
