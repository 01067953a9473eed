//! Process spawning boundary
//!
//! Everything up to the spawn is pure; [`ProcessRunner`] is the one seam that
//! touches the operating system, so tests can substitute a recording runner.

use crate::command::LaunchCommand;
use crate::error::LaunchError;
use std::process::{ExitCode, ExitStatus};
use tracing::debug;

/// Exit code reported when the training job cannot be spawned at all
pub const SPAWN_FAILURE_CODE: u8 = 127;

/// Runs a command to completion
pub trait ProcessRunner {
    /// Spawn `command`, block until it exits and report how it ended
    fn run(&self, command: &LaunchCommand) -> Result<ExitOutcome, LaunchError>;
}

/// Runner backed by `std::process::Command`
///
/// The child inherits environment, working directory and stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &LaunchCommand) -> Result<ExitOutcome, LaunchError> {
        debug!(program = ?command.program(), args = command.args().len(), "spawning");
        let status = command
            .to_command()
            .status()
            .map_err(|source| LaunchError::Spawn {
                program: command.program().to_string_lossy().into_owned(),
                source,
            })?;
        Ok(ExitOutcome::from_status(status))
    }
}

/// How the child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    code: i32,
}

impl ExitOutcome {
    /// Outcome with an explicit exit code
    pub fn from_code(code: i32) -> Self {
        Self { code }
    }

    /// Outcome of a finished child
    ///
    /// On Unix a child killed by signal `N` maps to `128 + N`, as a shell
    /// reports it.
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self { code };
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self { code: 128 + signal };
            }
        }
        Self { code: 1 }
    }

    /// Raw exit code
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Whether the child exited with status zero
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Exit status truncated to 8 bits, as a shell reports it
    ///
    /// A non-zero code whose low byte is zero maps to 1 so a failure never
    /// reads as success.
    pub fn status_byte(&self) -> u8 {
        match (self.code & 0xff) as u8 {
            0 if self.code != 0 => 1,
            byte => byte,
        }
    }

    /// Exit code to return from `main`
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status_byte())
    }
}
