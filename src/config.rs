//! Configuration management for Storage Monitor
//!
//! This module provides configuration persistence for scan limits, refresh
//! interval and device-list display options.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage Monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General options
    #[serde(default)]
    pub general: GeneralConfig,
    /// Device enumeration options
    #[serde(default)]
    pub scan: ScanConfig,
    /// Device list display options
    #[serde(default)]
    pub display: DisplayConfig,
}

/// General configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Statistics refresh interval in milliseconds
    #[serde(default = "default_update_interval")]
    pub update_interval_ms: u32,
}

/// Device enumeration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Physical drive indices `0..max_physical_drives` are probed
    #[serde(default = "default_max_physical_drives")]
    pub max_physical_drives: u32,
    /// Scan drive letters to find the volumes on each disk
    #[serde(default = "default_true")]
    pub include_drive_letters: bool,
}

/// Device list configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Visible columns
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

/// Columns the device list knows how to show
pub const KNOWN_COLUMNS: &[&str] = &[
    "index",
    "path",
    "vendor",
    "model",
    "revision",
    "serial",
    "bus",
    "letters",
    "capacity",
    "hotplug",
    "prediction",
];

// Default value functions
fn default_update_interval() -> u32 {
    1000 // 1 second
}

fn default_max_physical_drives() -> u32 {
    32
}

fn default_true() -> bool {
    true
}

fn default_columns() -> Vec<String> {
    vec![
        "index".to_string(),
        "model".to_string(),
        "letters".to_string(),
        "capacity".to_string(),
    ]
}

fn default_format() -> String {
    "text".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_physical_drives: default_max_physical_drives(),
            include_drive_letters: true,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            format: default_format(),
        }
    }
}

impl Config {
    /// Get the default configuration directory
    ///
    /// Returns `~/.config/stormon` on Unix-like systems,
    /// or `%APPDATA%\stormon` on Windows.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(windows) {
            std::env::var("APPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        } else {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from(".config"))
        };

        Ok(config_dir.join("stormon"))
    }

    /// Load configuration from the default path, falling back to defaults
    /// when no file exists
    pub fn load() -> Result<Self> {
        let config_file = Self::default_path()?.join("config.toml");

        if !config_file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_file)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::default_path()?;
        std::fs::create_dir_all(&config_dir)?;
        self.save_to(&config_dir.join("config.toml"))
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the rest of the crate cannot act on
    pub fn validate(&self) -> Result<()> {
        if self.general.update_interval_ms == 0 {
            return Err(Error::Config("update_interval_ms must be positive".into()));
        }
        if !matches!(self.display.format.as_str(), "text" | "json") {
            return Err(Error::Config(format!(
                "unknown output format '{}'",
                self.display.format
            )));
        }
        if let Some(column) = self
            .display
            .columns
            .iter()
            .find(|c| !KNOWN_COLUMNS.contains(&c.as_str()))
        {
            return Err(Error::Config(format!("unknown column '{}'", column)));
        }
        Ok(())
    }
}
