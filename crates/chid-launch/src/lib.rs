//! Launcher for distributed ChID fine-tuning
//!
//! Turns a [`FinetuneSettings`] record into one `torch.distributed.launch`
//! invocation of the ChID fine-tuning script and runs it, reporting the
//! child's exit status as its own.
//!
//! - [`build_command`] is pure: settings, launcher directory and port in,
//!   argument list out.
//! - [`ProcessRunner`] is the only boundary that spawns processes.
//!
//! # Example
//!
//! ```no_run
//! use chid_config::FinetuneSettings;
//! use chid_launch::{launch, launcher_dir, SystemRunner};
//!
//! let settings = FinetuneSettings::default();
//! let outcome = launch(&settings, &launcher_dir()?, Some("9090"), &SystemRunner)?;
//! std::process::exit(outcome.code());
//! # Ok::<(), chid_launch::LaunchError>(())
//! ```

pub mod command;
pub mod error;
pub mod locate;
pub mod runner;

pub use command::{build_command, resolve_master_port, LaunchCommand, DEFAULT_MASTER_PORT};
pub use error::LaunchError;
pub use locate::{launcher_dir, resolve_launcher_dir};
pub use runner::{ExitOutcome, ProcessRunner, SystemRunner, SPAWN_FAILURE_CODE};

use chid_config::FinetuneSettings;
use std::path::Path;
use tracing::{info, warn};

/// Validate the settings, build the command and run it once
///
/// Invalid settings fail before anything is spawned. A child that exits
/// non-zero is returned as an [`ExitOutcome`], not an error.
pub fn launch<R: ProcessRunner + ?Sized>(
    settings: &FinetuneSettings,
    launcher_dir: &Path,
    port: Option<&str>,
    runner: &R,
) -> Result<ExitOutcome, LaunchError> {
    settings.validate()?;

    let command = build_command(settings, launcher_dir, port);
    info!(
        model_name = %settings.launch.model_name,
        master_port = resolve_master_port(port),
        "launching fine-tuning job"
    );
    info!(command = %command.to_shell_line());

    let outcome = runner.run(&command)?;
    if outcome.success() {
        info!("fine-tuning job finished");
    } else {
        warn!(code = outcome.code(), "fine-tuning job exited with non-zero status");
    }
    Ok(outcome)
}
