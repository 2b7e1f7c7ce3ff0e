//! Engine settings.
//!
//! Runtime knobs for the engine are read from `settings.toml` in the Vista
//! config directory. Every section and key is optional; missing values fall
//! back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Runtime settings for the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Query binder settings
    #[serde(default)]
    pub query: QuerySettings,

    /// Search input settings
    #[serde(default)]
    pub search: SearchSettings,

    /// Board settings
    #[serde(default)]
    pub board: BoardSettings,
}

/// Query binder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Upper bound for a single fetch or mutation, in milliseconds.
    pub timeout_ms: u64,

    /// Page size used when a list configuration does not set one.
    pub page_size: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            page_size: 25,
        }
    }
}

impl QuerySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Search input settings.
///
/// The engine does not debounce; renderers read the interval from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub debounce_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

impl SearchSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Board settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    /// Pointer travel (in px) before a press turns into a drag.
    pub activation_distance: f32,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            activation_distance: 8.0,
        }
    }
}

impl EngineSettings {
    /// Parse settings from a TOML string.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load settings from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No settings found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let settings = Self::from_toml_str(&source)?;
        tracing::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Load settings from the default location.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = settings_path().ok_or(ConfigError::Io("Config directory not found".to_string()))?;
        Self::load(&path)
    }
}

/// Get the config directory path.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("vista"))
}

/// Get the path to settings.toml.
pub fn settings_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("settings.toml"))
}
