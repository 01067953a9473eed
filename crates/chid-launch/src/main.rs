//! ChID fine-tuning launcher
//!
//! Runs the distributed fine-tuning script for a CPM checkpoint on ChID with a
//! fixed set of hyperparameters.
//!
//! # Usage
//!
//! ```bash
//! chid-launch [PORT] \
//!   [--preset small|medium|large] \
//!   [--config overrides.json] \
//!   [--script-dir ./scripts] \
//!   [--dry-run | --print-config]
//! ```
//!
//! With no arguments the job runs with master port 1122. The exit code is the
//! training job's own.

use anyhow::{Context, Result};
use chid_config::{FinetuneSettings, ModelPreset};
use chid_launch::{
    build_command, launch, resolve_launcher_dir, LaunchError, SystemRunner, SPAWN_FAILURE_CODE,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Launch distributed ChID fine-tuning of a CPM model
#[derive(Parser, Debug)]
#[command(name = "chid-launch")]
#[command(about = "Launch distributed ChID fine-tuning of a CPM model", long_about = None)]
struct Args {
    /// Master port for the distributed rendezvous (absent or empty: 1122)
    port: Option<String>,

    /// CPM model size to fine-tune
    #[arg(long, value_name = "NAME", default_value = "large")]
    preset: ModelPreset,

    /// JSON file overriding individual settings of the preset
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory the training script and DeepSpeed config are resolved against
    /// (default: the launcher's own directory)
    #[arg(long, value_name = "PATH")]
    script_dir: Option<PathBuf>,

    /// Print the command line instead of running it
    #[arg(long)]
    dry_run: bool,

    /// Print the effective settings as JSON and exit
    #[arg(long, conflicts_with = "dry_run")]
    print_config: bool,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chid_launch=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Preset first, then the override file on top
    let base = FinetuneSettings::preset(args.preset);
    let settings = match &args.config {
        Some(config_path) => {
            FinetuneSettings::from_file(config_path, &base).context("Failed to load config file")?
        }
        None => base,
    };

    if args.print_config {
        settings.validate().context("Invalid fine-tuning settings")?;
        println!("{}", settings.to_json_pretty()?);
        return Ok(ExitCode::SUCCESS);
    }

    let launcher_dir = resolve_launcher_dir(args.script_dir.as_deref())
        .context("Failed to locate the fine-tuning scripts")?;

    if args.dry_run {
        settings.validate().context("Invalid fine-tuning settings")?;
        let command = build_command(&settings, &launcher_dir, args.port.as_deref());
        println!("{}", command.to_shell_line());
        return Ok(ExitCode::SUCCESS);
    }

    // Terminal signals reach the child through the shared process group; the
    // launcher keeps waiting so the child's own exit code is reported.
    ctrlc::set_handler(|| {
        tracing::warn!("interrupt received, waiting for the fine-tuning job to exit");
    })
    .context("Failed to install signal handler")?;

    match launch(&settings, &launcher_dir, args.port.as_deref(), &SystemRunner) {
        Ok(outcome) => Ok(outcome.exit_code()),
        Err(err @ LaunchError::Spawn { .. }) => {
            tracing::error!("{}", err);
            Ok(ExitCode::from(SPAWN_FAILURE_CODE))
        }
        Err(err) => Err(err.into()),
    }
}
