//! TOML-based viewer configuration.
//!
//! Stores the viewer's defaults (refresh interval, tree display, time
//! formatting) at `~/.config/taskline/config.toml`. CLI flags override
//! these per invocation. Set `TASKLINE_ENV=dev` to use a separate
//! development config directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

fn default_refresh_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

/// Viewer configuration.
///
/// Serialized to/from TOML at `~/.config/taskline[-dev]/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// How often the watch command polls the log file, in milliseconds.
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
    /// Indent child tasks with tree rails.
    #[serde(default = "default_true")]
    pub show_tree: bool,
    /// Adaptive duration units (ms/s/M:SS/H:MM:SS) instead of fixed
    /// H:MM:SS.mmm.
    #[serde(default = "default_true")]
    pub adaptive_time: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            refresh_ms: default_refresh_ms(),
            show_tree: true,
            adaptive_time: true,
        }
    }
}

/// Returns `~/.config/taskline[-dev]/` based on TASKLINE_ENV, creating it
/// on demand.
pub fn config_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TASKLINE_ENV").unwrap_or_else(|_| "production".to_string());
    let dir = if env == "dev" {
        base_dir.join("taskline-dev")
    } else {
        base_dir.join("taskline")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

impl ViewerConfig {
    fn path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::path()?)
    }

    /// Load from an explicit path (for testing).
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path,
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(Self::path()?)
    }

    /// Persist to an explicit path (for testing).
    pub fn save_to(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as a string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "refresh_ms" => Some(self.refresh_ms.to_string()),
            "show_tree" => Some(self.show_tree.to_string()),
            "adaptive_time" => Some(self.adaptive_time.to_string()),
            _ => None,
        }
    }

    /// Set a config value by key and persist it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        match key {
            "refresh_ms" => {
                self.refresh_ms = value.parse().map_err(|_| invalid("expected an integer".into()))?
            }
            "show_tree" => {
                self.show_tree = value.parse().map_err(|_| invalid("expected true or false".into()))?
            }
            "adaptive_time" => {
                self.adaptive_time = value.parse().map_err(|_| invalid("expected true or false".into()))?
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string()).into()),
        }
        self.save()?;
        Ok(())
    }
}
