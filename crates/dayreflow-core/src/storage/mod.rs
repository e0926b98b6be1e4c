mod config;

pub use config::{CalendarConfig, Config, ReflowConfig, SnapshotConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/dayreflow[-dev]/` based on DAYREFLOW_ENV.
///
/// Set DAYREFLOW_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("DAYREFLOW_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("dayreflow-dev")
    } else {
        base_dir.join("dayreflow")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
