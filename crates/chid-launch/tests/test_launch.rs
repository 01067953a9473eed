//! Integration tests for the spawn boundary

use chid_config::FinetuneSettings;
use chid_launch::{launch, ExitOutcome, LaunchCommand, LaunchError, ProcessRunner, SystemRunner};
use std::cell::RefCell;
use std::path::Path;

/// Runner that records commands instead of spawning them
struct RecordingRunner {
    code: i32,
    commands: RefCell<Vec<LaunchCommand>>,
}

impl RecordingRunner {
    fn exiting_with(code: i32) -> Self {
        Self {
            code,
            commands: RefCell::new(Vec::new()),
        }
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, command: &LaunchCommand) -> Result<ExitOutcome, LaunchError> {
        self.commands.borrow_mut().push(command.clone());
        Ok(ExitOutcome::from_code(self.code))
    }
}

#[test]
fn test_launch_spawns_exactly_once() {
    let runner = RecordingRunner::exiting_with(0);
    let outcome = launch(
        &FinetuneSettings::default(),
        Path::new("/opt/chid"),
        Some("9090"),
        &runner,
    )
    .expect("Launch failed");

    assert!(outcome.success());
    let commands = runner.commands.borrow();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].value_of("--master_port").unwrap(), "9090");
}

#[test]
fn test_launch_returns_child_failure_as_outcome() {
    let runner = RecordingRunner::exiting_with(3);
    let outcome = launch(&FinetuneSettings::default(), Path::new("/opt/chid"), None, &runner)
        .expect("Non-zero exit is not an error");

    assert_eq!(outcome.code(), 3);
    assert!(!outcome.success());
}

#[test]
fn test_invalid_settings_never_spawn() {
    let mut settings = FinetuneSettings::default();
    settings.model.hidden_size = 1000;
    let runner = RecordingRunner::exiting_with(0);

    let result = launch(&settings, Path::new("/opt/chid"), None, &runner);

    assert!(matches!(result, Err(LaunchError::Config(_))));
    assert!(runner.commands.borrow().is_empty());
}

#[test]
fn test_spawn_failure() {
    let command = LaunchCommand::new("/nonexistent/chid/python3");
    let result = SystemRunner.run(&command);

    match result {
        Err(LaunchError::Spawn { program, .. }) => {
            assert_eq!(program, "/nonexistent/chid/python3");
        }
        other => panic!("Expected spawn error, got {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn test_system_runner_propagates_exit_codes() {
    for code in [0, 1, 3] {
        let mut command = LaunchCommand::new("sh");
        command.arg("-c").arg(format!("exit {}", code));

        let outcome = SystemRunner.run(&command).expect("Failed to run sh");
        assert_eq!(outcome.code(), code);
    }
}

#[cfg(unix)]
#[test]
fn test_system_runner_reports_signal() {
    let mut command = LaunchCommand::new("sh");
    command.arg("-c").arg("kill -TERM $$");

    let outcome = SystemRunner.run(&command).expect("Failed to run sh");
    assert_eq!(outcome.code(), 128 + 15);
}

#[test]
fn test_launcher_dir_is_absolute_directory() {
    let dir = chid_launch::launcher_dir().expect("Failed to resolve launcher dir");
    assert!(dir.is_absolute());
    assert!(dir.is_dir());
}

#[test]
fn test_explicit_script_dir() {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    let resolved =
        chid_launch::resolve_launcher_dir(Some(temp.path())).expect("Failed to resolve dir");
    assert_eq!(resolved, temp.path().canonicalize().unwrap());

    let missing = chid_launch::resolve_launcher_dir(Some(Path::new("/nonexistent/chid/scripts")));
    assert!(matches!(missing, Err(LaunchError::LauncherDir(_))));
}
