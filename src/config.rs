use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::paths::{ensure_data_dir, validate_file_name};
use crate::phase::WeightTable;
use crate::progress::DEFAULT_EVENT_BUFFER;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupConfig {
    #[serde(default)]
    pub weights: WeightTable,
    /// Capacity of the snapshot broadcast channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    #[serde(default = "default_marker_file")]
    pub marker_file: String,
}

fn default_event_buffer() -> usize {
    DEFAULT_EVENT_BUFFER
}

fn default_marker_file() -> String {
    "setup_complete.marker".to_string()
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            weights: WeightTable::default(),
            event_buffer: default_event_buffer(),
            marker_file: default_marker_file(),
        }
    }
}

impl SetupConfig {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if self.event_buffer == 0 {
            return Err(AppError::config("event_buffer must be at least 1"));
        }
        validate_file_name(&self.marker_file)
    }
}

/// Load the config at `path`, writing defaults if the file does not exist yet.
pub fn load_config_from(path: &Path) -> Result<SetupConfig> {
    if !path.exists() {
        let config = SetupConfig::default();
        save_config_to(path, &config)?;
        return Ok(config);
    }
    let content = fs::read_to_string(path).map_err(|e| AppError::config(e.to_string()))?;
    let config: SetupConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config_to(path: &Path, config: &SetupConfig) -> Result<()> {
    config.validate()?;
    if let Some(parent) = path.parent() {
        ensure_data_dir(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content).map_err(|e| AppError::config(e.to_string()))
}
