//! Launcher errors

use chid_config::ConfigError;
use std::io;
use thiserror::Error;

/// Errors that stop the launcher before or while spawning the training job
///
/// A child that runs and exits non-zero is not an error; see
/// [`ExitOutcome`](crate::runner::ExitOutcome).
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("invalid fine-tuning settings: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to resolve launcher directory: {0}")]
    LauncherDir(#[source] io::Error),
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}
