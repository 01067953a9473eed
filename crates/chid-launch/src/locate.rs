//! Launcher directory resolution

use crate::error::LaunchError;
use std::path::{Path, PathBuf};

/// Directory containing the running launcher executable
///
/// Symlinks are resolved, so a launcher reached through a link still finds
/// the files next to its real location.
pub fn launcher_dir() -> Result<PathBuf, LaunchError> {
    let exe = std::env::current_exe().map_err(LaunchError::LauncherDir)?;
    let exe = exe.canonicalize().map_err(LaunchError::LauncherDir)?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/")))
}

/// `explicit` canonicalized when given, otherwise [`launcher_dir`]
pub fn resolve_launcher_dir(explicit: Option<&Path>) -> Result<PathBuf, LaunchError> {
    match explicit {
        Some(dir) => dir.canonicalize().map_err(LaunchError::LauncherDir),
        None => launcher_dir(),
    }
}
