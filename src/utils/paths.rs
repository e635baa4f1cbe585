//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Clausewise directory (~/.clausewise/)
pub fn clausewise_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".clausewise"))
}

/// Get the config file path (~/.clausewise/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(clausewise_dir()?.join("config.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the Clausewise directory, creating if it doesn't exist
pub fn ensure_clausewise_dir() -> AppResult<PathBuf> {
    let path = clausewise_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
