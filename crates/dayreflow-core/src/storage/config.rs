//! TOML-based configuration.
//!
//! Stores:
//! - Which remote calendar to reflow and where its API lives
//! - The urgent-insertion shrink policy and default color
//! - The snapshot database file name
//!
//! Configuration is stored at `~/.config/dayreflow/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::event::ColorTag;
use crate::timeline::ShrinkPolicy;

/// Remote calendar settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Reflow behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflowConfig {
    #[serde(default)]
    pub urgent_policy: ShrinkPolicy,
    /// Color id used when an urgent request names none.
    #[serde(default = "default_color")]
    pub default_color: String,
}

/// Snapshot storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// File name inside the data directory.
    #[serde(default = "default_snapshot_db")]
    pub database: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/dayreflow/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub reflow: ReflowConfig,
    #[serde(default)]
    pub snapshots: SnapshotConfig,
}

fn default_calendar_id() -> String {
    "primary".into()
}
fn default_api_base() -> String {
    "https://www.googleapis.com/calendar/v3".into()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_color() -> String {
    ColorTag::Lavender.id().into()
}
fn default_snapshot_db() -> String {
    "snapshots.db".into()
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            calendar_id: default_calendar_id(),
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self {
            urgent_policy: ShrinkPolicy::default(),
            default_color: default_color(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            database: default_snapshot_db(),
        }
    }
}

impl CalendarConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ReflowConfig {
    /// The configured default color, Lavender if the stored id is unknown.
    pub fn default_color(&self) -> ColorTag {
        self.default_color.parse().unwrap_or_default()
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or create the default file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = key
            .split('.')
            .try_fold(&json, |node, part| node.get(part))?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let value = value.trim();

        match key {
            "calendar.calendar_id" => {
                if value.is_empty() {
                    return Err(invalid("calendar id is empty".into()));
                }
                self.calendar.calendar_id = value.to_string();
            }
            "calendar.api_base" => {
                url::Url::parse(value).map_err(|e| invalid(e.to_string()))?;
                self.calendar.api_base = value.trim_end_matches('/').to_string();
            }
            "calendar.request_timeout_secs" => {
                let secs: u64 = value.parse().map_err(|_| invalid(format!("cannot parse '{value}' as seconds")))?;
                if secs == 0 {
                    return Err(invalid("timeout must be at least one second".into()));
                }
                self.calendar.request_timeout_secs = secs;
            }
            "reflow.urgent_policy" => {
                self.reflow.urgent_policy =
                    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
                        .map_err(|_| invalid(format!("expected 'budget' or 'legacy', got '{value}'")))?;
            }
            "reflow.default_color" => {
                let color: ColorTag = value.parse().map_err(invalid)?;
                self.reflow.default_color = color.id().to_string();
            }
            "snapshots.database" => {
                if value.is_empty() {
                    return Err(invalid("database file name is empty".into()));
                }
                self.snapshots.database = value.to_string();
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}
