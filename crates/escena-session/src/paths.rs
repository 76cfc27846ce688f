//! Platform-specific directories for workspace files.
//!
//! - **Linux**: `~/.config/escena/workspaces/`
//! - **macOS**: `~/Library/Application Support/escena/workspaces/`
//! - **Windows**: `%APPDATA%\escena\workspaces\`

use std::path::PathBuf;

use crate::error::SessionError;

/// Application name used for directory paths.
const APP_NAME: &str = "escena";

/// Subdirectory name for workspace files.
const WORKSPACES_SUBDIR: &str = "workspaces";

/// Returns the user configuration directory.
///
/// Falls back to the current directory when the platform config directory
/// cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user workspaces directory.
pub fn user_workspaces_dir() -> PathBuf {
    user_config_dir().join(WORKSPACES_SUBDIR)
}

/// Creates the user workspaces directory if needed and returns it.
pub fn ensure_user_workspaces_dir() -> Result<PathBuf, SessionError> {
    let dir = user_workspaces_dir();
    std::fs::create_dir_all(&dir).map_err(|e| SessionError::create_dir(&dir, e))?;
    Ok(dir)
}

/// Returns the path of a named workspace file (`<name>.json`).
pub fn workspace_file(name: &str) -> PathBuf {
    user_workspaces_dir().join(format!("{name}.json"))
}

/// Lists workspace files in the user directory, sorted by name.
///
/// Returns an empty list when the directory does not exist.
pub fn list_user_workspaces() -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(user_workspaces_dir()) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}
