//! Centralized path utilities.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Get the root data directory (~/.genai_setup).
pub fn get_data_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| AppError::io("Cannot find home directory"))?;
    Ok(home.join(".genai_setup"))
}

/// Get the path to the config file inside `data_dir`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("setup.toml")
}

/// Get the path to the setup completion marker inside `data_dir`.
pub fn marker_path(data_dir: &Path, marker_file: &str) -> PathBuf {
    data_dir.join(marker_file)
}

/// Ensure the data directory exists.
pub fn ensure_data_dir(data_dir: &Path) -> Result<()> {
    fs::create_dir_all(data_dir)
        .map_err(|e| AppError::io(format!("Failed to create data dir {:?}: {}", data_dir, e)))
}

/// A marker file name must stay inside the data directory.
pub fn validate_file_name(name: &str) -> Result<()> {
    let is_safe = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if !is_safe {
        return Err(AppError::config(format!("Invalid file name: {:?}", name)));
    }
    Ok(())
}
