//! Configuration for the diagnostics engine
//!
//! All values here are fixed at build/config time; nothing in the request
//! protocol can mutate them. The simulator loads the file from a
//! platform-specific location, firmware builds would bake the values in.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/keyboard-diagnostics/config.toml` |
//! | macOS | `~/Library/Application Support/keyboard-diagnostics/config.toml` |
//! | Windows | `%APPDATA%\keyboard-diagnostics\config.toml` |

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize config
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Returns the path to the config file.
///
/// Creates the config directory if it doesn't exist.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    let app_dir = config_dir.join("keyboard-diagnostics");

    if !app_dir.exists() {
        fs::create_dir_all(&app_dir)?;
    }

    Ok(app_dir.join("config.toml"))
}

/// Top-level diagnostics configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DiagnosticsConfig {
    /// Chatter detection settings
    pub chatter: ChatterConfig,
    /// Battery history settings
    pub history: HistoryConfig,
    /// Layout snapshot bounds
    pub layout: LayoutConfig,
}

/// Chatter detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatterConfig {
    /// Window in ms inside which a repeat transition counts as chatter
    pub window_ms: u64,
}

impl Default for ChatterConfig {
    fn default() -> Self {
        Self { window_ms: 5 }
    }
}

/// Battery history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Ring buffer capacity in samples
    pub capacity: usize,
    /// Seconds between battery samples
    pub sample_interval_seconds: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 120,
            sample_interval_seconds: 600,
        }
    }
}

/// Layout snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Largest key count a report can carry; anything beyond is truncated
    pub max_keys: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { max_keys: 128 }
    }
}

impl DiagnosticsConfig {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: DiagnosticsConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
