use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::ProbeError;

/// Group whose members may use the elevation tool unless configured otherwise.
pub const DEFAULT_ELEVATION_GROUP: &str = "sudo";

// ============================================================================
// IdentityProbe Trait - Host User Queries
// ============================================================================

/// Queries the host for who is running the process and what they may do.
///
/// Task construction talks to the host only through this trait, so callers
/// (and tests) can substitute their own source of identity information.
///
/// # Example
///
/// ```rust
/// use taskrun_identity::{IdentityProbe, ProbeError};
///
/// struct FixedProbe;
///
/// impl IdentityProbe for FixedProbe {
///     fn current_username(&self) -> Result<String, ProbeError> {
///         Ok("deploy".to_string())
///     }
///
///     fn ensure_elevation(&self, _username: &str) -> Result<(), ProbeError> {
///         Ok(())
///     }
/// }
///
/// assert_eq!(FixedProbe.current_username().unwrap(), "deploy");
/// ```
pub trait IdentityProbe {
    /// Name of the invoking user, trimmed.
    fn current_username(&self) -> Result<String, ProbeError>;

    /// Succeeds iff `username` exists and belongs to the elevation group.
    ///
    /// An empty (or all-whitespace) `username` means the invoking user.
    fn ensure_elevation(&self, username: &str) -> Result<(), ProbeError>;
}

impl<P: IdentityProbe + ?Sized> IdentityProbe for &P {
    fn current_username(&self) -> Result<String, ProbeError> {
        (**self).current_username()
    }

    fn ensure_elevation(&self, username: &str) -> Result<(), ProbeError> {
        (**self).ensure_elevation(username)
    }
}

// ============================================================================
// SystemProbe - whoami / groups
// ============================================================================

/// Probe backed by the host's `whoami` and `groups` tools.
///
/// The OS tools are used instead of reading `/etc/group` so the answer matches
/// what the elevation tool itself will honour (NSS, LDAP and friends included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemProbe {
    group: String,
    groups_tool: &'static str,
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe {
    /// Probe checking membership of the `sudo` group.
    #[must_use]
    pub fn new() -> Self {
        Self::with_group(DEFAULT_ELEVATION_GROUP)
    }

    /// Probe checking membership of a different elevation group (e.g. `wheel`).
    #[must_use]
    pub fn with_group(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            groups_tool: "groups",
        }
    }

    /// The elevation group this probe checks for.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Group names reported by `groups <username>`.
    ///
    /// A missing `groups` tool is [`ProbeError::ProbeUnavailable`]; a
    /// non-zero exit means the user does not exist.
    pub fn groups(&self, username: &str) -> Result<Vec<String>, ProbeError> {
        debug!(user = %username, "Querying group membership");

        let output = Command::new(self.groups_tool)
            .arg(username)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| ProbeError::ProbeUnavailable {
                reason: format!("failed to execute '{}': {e}", self.groups_tool),
            })?;

        if !output.status.success() {
            return Err(ProbeError::UnknownUser {
                user: username.to_string(),
            });
        }

        Ok(parse_groups(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl IdentityProbe for SystemProbe {
    fn current_username(&self) -> Result<String, ProbeError> {
        let output = Command::new("whoami")
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ProbeError::ProbeUnavailable {
                reason: format!("failed to execute 'whoami': {e}"),
            })?;

        if !output.status.success() {
            return Err(ProbeError::ProbeUnavailable {
                reason: format!(
                    "'whoami' failed with exit code: {}",
                    output.status.code().unwrap_or(-1)
                ),
            });
        }

        let username = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if username.is_empty() {
            return Err(ProbeError::ProbeUnavailable {
                reason: "'whoami' printed nothing".to_string(),
            });
        }

        debug!(user = %username, "Resolved invoking user");
        Ok(username)
    }

    fn ensure_elevation(&self, username: &str) -> Result<(), ProbeError> {
        let username = match username.trim() {
            "" => self.current_username()?,
            name => name.to_string(),
        };

        let groups = self.groups(&username)?;
        if has_group(&groups, &self.group) {
            Ok(())
        } else {
            Err(ProbeError::NotPrivileged {
                user: username,
                group: self.group.clone(),
            })
        }
    }
}

/// Group tokens from `groups` output, without the `user : ` prefix Linux
/// prints when given a name.
fn parse_groups(output: &str) -> Vec<String> {
    let list = match output.split_once(" : ") {
        Some((_, groups)) => groups,
        None => output,
    };
    list.split_whitespace().map(str::to_string).collect()
}

/// Substring match on the group list, mirroring what operators grep for.
fn has_group(groups: &[String], group: &str) -> bool {
    !group.is_empty() && groups.join(" ").contains(group)
}
