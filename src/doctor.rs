//! Doctor command for environment health checks
//!
//! Preflight checks for everything a task needs from the host: the login
//! shell, the elevation tool, the identity utilities and the elevation group
//! membership of the configured account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;

use taskrun_config::Config;
use taskrun_identity::IdentityProbe;
use taskrun_runner::OsFamily;

/// Schema version of [`DoctorOutput`]
pub const DOCTOR_SCHEMA_VERSION: &str = "1";

/// Doctor report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorOutput {
    /// Schema version for this doctor format
    pub schema_version: String,
    /// RFC3339 UTC timestamp when the doctor output was emitted
    pub emitted_at: DateTime<Utc>,
    /// Overall health status (true if all checks pass or warn, false if any fail)
    pub ok: bool,
    /// Health checks performed, sorted by name
    pub checks: Vec<DoctorCheck>,
}

/// Individual health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorCheck {
    pub name: String,
    pub status: CheckStatus,
    pub details: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Pass => "✓",
            Self::Warn => "⚠",
            Self::Fail => "✗",
        }
    }
}

impl DoctorCheck {
    fn new(name: &str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            details: details.into(),
        }
    }
}

/// Run all health checks.
pub fn run_checks(config: &Config, probe: &dyn IdentityProbe) -> DoctorOutput {
    let mut checks = vec![
        check_platform(),
        check_config(config),
        check_shell(config),
        check_on_path("elevation_tool", &config.elevation.tool, CheckStatus::Warn),
        check_on_path("whoami_path", "whoami", CheckStatus::Warn),
        check_on_path("groups_path", "groups", CheckStatus::Warn),
        check_current_user(probe),
        check_elevation_rights(config, probe),
    ];

    // Sort checks by name for stable output
    checks.sort_by(|a, b| a.name.cmp(&b.name));

    let ok = !checks.iter().any(|c| c.status == CheckStatus::Fail);

    DoctorOutput {
        schema_version: DOCTOR_SCHEMA_VERSION.to_string(),
        emitted_at: Utc::now(),
        ok,
        checks,
    }
}

fn check_platform() -> DoctorCheck {
    let os = std::env::consts::OS;
    if OsFamily::host().supports_elevation() {
        DoctorCheck::new("platform", CheckStatus::Pass, format!("{os} supports elevation"))
    } else {
        DoctorCheck::new(
            "platform",
            CheckStatus::Warn,
            format!("{os} does not support elevation; tasks can only run as the invoking user"),
        )
    }
}

fn check_config(config: &Config) -> DoctorCheck {
    let origin = match &config.config_path {
        Some(path) => format!("Loaded {}", path.display()),
        None => "Using built-in defaults".to_string(),
    };

    match config.validate() {
        Ok(()) => DoctorCheck::new("config_parse", CheckStatus::Pass, origin),
        Err(e) => DoctorCheck::new("config_parse", CheckStatus::Fail, format!("{origin}: {e}")),
    }
}

fn check_shell(config: &Config) -> DoctorCheck {
    match which::which(&config.shell.path) {
        Ok(path) => DoctorCheck::new(
            "shell_path",
            CheckStatus::Pass,
            format!("Found shell at {}", path.display()),
        ),
        Err(e) => DoctorCheck::new(
            "shell_path",
            CheckStatus::Fail,
            format!("Shell {} is not executable: {e}", config.shell.path.display()),
        ),
    }
}

/// `missing` is the status reported when `program` is not on `PATH`.
fn check_on_path(name: &str, program: impl AsRef<OsStr>, missing: CheckStatus) -> DoctorCheck {
    let program = program.as_ref();
    match which::which(program) {
        Ok(path) => DoctorCheck::new(
            name,
            CheckStatus::Pass,
            format!("Found {} at {}", program.to_string_lossy(), path.display()),
        ),
        Err(_) => DoctorCheck::new(
            name,
            missing,
            format!("{} not found in PATH", program.to_string_lossy()),
        ),
    }
}

fn check_current_user(probe: &dyn IdentityProbe) -> DoctorCheck {
    match probe.current_username() {
        Ok(user) => DoctorCheck::new("current_user", CheckStatus::Pass, format!("Running as {user}")),
        Err(e) => DoctorCheck::new("current_user", CheckStatus::Fail, e.to_string()),
    }
}

fn check_elevation_rights(config: &Config, probe: &dyn IdentityProbe) -> DoctorCheck {
    let account = match config.service_account() {
        "" => "the invoking user".to_string(),
        account => format!("`{account}`"),
    };

    match probe.ensure_elevation(config.service_account()) {
        Ok(()) => DoctorCheck::new(
            "elevation_rights",
            CheckStatus::Pass,
            format!("{account} is in the `{}` group", config.elevation.group),
        ),
        Err(e) => DoctorCheck::new(
            "elevation_rights",
            CheckStatus::Warn,
            format!("{e}; --run-as and --sudo will be rejected"),
        ),
    }
}
