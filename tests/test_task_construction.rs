//! Task construction through the public API
//!
//! Identity lookups go through a scripted probe so these tests never depend on
//! the accounts of the machine running them.

use std::cell::Cell;
use std::ffi::OsString;

use taskrun::{
    IdentityProbe, ProbeError, Quoting, Runner, ShellSettings, Task, TaskError, TaskOptions,
};

/// Probe answering from a fixed user and elevation-group roster, counting
/// how often it was asked.
struct ScriptedProbe {
    user: &'static str,
    elevated: &'static [&'static str],
    calls: Cell<usize>,
}

impl ScriptedProbe {
    fn new(user: &'static str, elevated: &'static [&'static str]) -> Self {
        Self {
            user,
            elevated,
            calls: Cell::new(0),
        }
    }
}

impl IdentityProbe for ScriptedProbe {
    fn current_username(&self) -> Result<String, ProbeError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.user.to_string())
    }

    fn ensure_elevation(&self, username: &str) -> Result<(), ProbeError> {
        self.calls.set(self.calls.get() + 1);
        let username = if username.is_empty() { self.user } else { username };
        if self.elevated.contains(&username) {
            Ok(())
        } else {
            Err(ProbeError::NotPrivileged {
                user: username.to_string(),
                group: "sudo".to_string(),
            })
        }
    }
}

fn script_of(task: &Task) -> String {
    Runner::new(task)
        .invocation()
        .script()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ============================================================================
// Plain tasks
// ============================================================================

#[test]
fn test_plain_task_runs_through_login_shell() {
    let task = Task::builder("ls")
        .arguments(["-la"])
        .working_dir("/var/log")
        .build()
        .unwrap();

    let invocation = Runner::new(&task).invocation();
    assert_eq!(invocation.program, OsString::from("/bin/bash"));
    assert_eq!(
        invocation.args,
        vec![
            OsString::from("-lc"),
            OsString::from("cd /var/log && ls -la")
        ]
    );
}

#[test]
fn test_no_trailing_space_without_arguments() {
    let task = Task::builder("uptime").build().unwrap();
    assert_eq!(script_of(&task), "uptime");
}

#[test]
fn test_arguments_joined_verbatim_by_default() {
    let task = Task::builder("grep")
        .arguments(["-r", "'needle in'", "/srv | wc -l"])
        .build()
        .unwrap();
    assert_eq!(task.quoting(), Quoting::Verbatim);
    assert_eq!(script_of(&task), "grep -r 'needle in' /srv | wc -l");
}

#[test]
fn test_posix_quoting_protects_metacharacters() {
    let task = Task::builder("echo")
        .arguments(["$(id)", "a;b"])
        .working_dir("/tmp/with space")
        .quote_arguments()
        .build()
        .unwrap();
    assert_eq!(
        script_of(&task),
        "cd '/tmp/with space' && echo '$(id)' 'a;b'"
    );
}

#[test]
fn test_plain_task_never_consults_probe() {
    let probe = ScriptedProbe::new("alice", &[]);
    let options = TaskOptions {
        command: "true".to_string(),
        ..TaskOptions::default()
    };

    let task = Task::from_options(options, &probe).unwrap();
    assert!(task.run_as().is_none());
    assert_eq!(probe.calls.get(), 0);
}

#[test]
fn test_empty_command_rejected() {
    let probe = ScriptedProbe::new("alice", &["alice"]);
    let options = TaskOptions {
        command: "  ".to_string(),
        ..TaskOptions::default()
    };
    assert!(matches!(
        Task::from_options(options, &probe),
        Err(TaskError::EmptyCommand)
    ));
}

// ============================================================================
// Target users
// ============================================================================

#[cfg(unix)]
#[test]
fn test_run_as_other_user_wraps_with_sudo() {
    let probe = ScriptedProbe::new("alice", &["alice"]);
    let task = Task::builder("whoami")
        .run_as("deploy", &probe)
        .unwrap()
        .build()
        .unwrap();

    let invocation = Runner::new(&task).invocation();
    assert_eq!(invocation.program, OsString::from("sudo"));
    let args: Vec<String> = invocation
        .args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(args, ["-HSu", "deploy", "/bin/bash", "-lc", "whoami"]);
}

#[cfg(unix)]
#[test]
fn test_run_as_self_skips_wrapper() {
    let probe = ScriptedProbe::new("alice", &["alice"]);
    let task = Task::builder("whoami")
        .run_as(" alice ", &probe)
        .unwrap()
        .build()
        .unwrap();

    assert!(task.is_same_user());
    let invocation = Runner::new(&task).invocation();
    assert_eq!(invocation.program, OsString::from("/bin/bash"));
    assert!(!invocation.mentions("sudo"));
}

#[cfg(unix)]
#[test]
fn test_run_as_sudo_checks_group_but_runs_unwrapped() {
    let probe = ScriptedProbe::new("alice", &["alice"]);
    let task = Task::builder("id")
        .run_as_sudo(&probe)
        .unwrap()
        .build()
        .unwrap();

    // Both the identity lookup and the group check were made
    assert_eq!(probe.calls.get(), 2);
    assert_eq!(task.running_as(), Some("alice"));
    assert_eq!(task.run_as(), Some("alice"));

    let invocation = Runner::new(&task).invocation();
    assert_eq!(invocation.program, OsString::from("/bin/bash"));
    assert!(!invocation.mentions("sudo"));
    assert_eq!(script_of(&task), "id");
}

#[cfg(unix)]
#[test]
fn test_run_as_sudo_rejected_without_group_membership() {
    let probe = ScriptedProbe::new("mallory", &["alice"]);
    match Task::builder("id").run_as_sudo(&probe) {
        Err(TaskError::Probe(ProbeError::NotPrivileged { user, .. })) => {
            assert_eq!(user, "mallory");
        }
        other => panic!("Expected NotPrivileged, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_run_as_without_group_membership_rejected() {
    let probe = ScriptedProbe::new("mallory", &["alice"]);
    let result = Task::builder("id").run_as("root", &probe);
    match result {
        Err(TaskError::Probe(ProbeError::NotPrivileged { user, group })) => {
            assert_eq!(user, "mallory");
            assert_eq!(group, "sudo");
        }
        other => panic!("Expected NotPrivileged, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_service_account_gates_elevation() {
    let probe = ScriptedProbe::new("alice", &["ccm"]);
    let options = TaskOptions {
        run_as: "postgres".to_string(),
        command: "psql".to_string(),
        ..TaskOptions::default()
    };

    assert!(Task::from_options(options.clone(), &probe).is_err());

    let task = Task::from_options_as(options, "ccm", &probe).unwrap();
    assert_eq!(task.running_as(), Some("alice"));
    assert_eq!(task.run_as(), Some("postgres"));
}

#[cfg(unix)]
#[test]
fn test_custom_elevation_tool() {
    let probe = ScriptedProbe::new("alice", &["alice"]);
    let task = Task::builder("id")
        .run_as("root", &probe)
        .unwrap()
        .build()
        .unwrap();

    let settings = ShellSettings {
        elevator: "doas".to_string(),
        elevator_flags: String::new(),
        ..ShellSettings::default()
    };
    let invocation = Runner::new(&task).shell(settings).invocation();
    assert_eq!(invocation.program, OsString::from("doas"));
    assert_eq!(invocation.args[0], OsString::from("-u"));
    assert_eq!(invocation.args[1], OsString::from("root"));
}

#[cfg(not(unix))]
#[test]
fn test_run_as_unsupported_off_unix() {
    let probe = ScriptedProbe::new("alice", &["alice"]);
    let result = Task::builder("id").run_as("root", &probe);
    assert!(matches!(result, Err(TaskError::PlatformUnsupported { .. })));
}

// ============================================================================
// Task files
// ============================================================================

#[test]
fn test_options_json_round_trip() {
    let input = r#"{
        "command": "tar",
        "arguments": ["czf", "/tmp/out.tgz", "."],
        "working_dir": "/srv/app",
        "fail_on_error": true
    }"#;

    let options = TaskOptions::from_json(input).unwrap();
    let probe = ScriptedProbe::new("alice", &[]);
    let task = Task::from_options(options.clone(), &probe).unwrap();

    assert!(task.fail_on_error());
    assert_eq!(task.working_dir(), Some("/srv/app"));
    assert_eq!(script_of(&task), "cd /srv/app && tar czf /tmp/out.tgz .");

    let reparsed = TaskOptions::from_json(&serde_json::to_string(&options).unwrap()).unwrap();
    assert_eq!(reparsed, options);
}

#[test]
fn test_options_unknown_type_rejected() {
    let result = TaskOptions::from_json(r#"{"command": 42}"#);
    assert!(matches!(result, Err(TaskError::InvalidOptions { .. })));
}
