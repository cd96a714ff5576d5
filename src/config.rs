//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\path-tagger\config.toml
//! - macOS: ~/Library/Application Support/path-tagger/config.toml
//! - Linux: ~/.config/path-tagger/config.toml
//!
//! The file is read once at startup. The guessing patterns and placeholder
//! tables it holds are turned into an immutable
//! [`PluginConfig`](crate::hooks::PluginConfig) and never change during a run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Path-based field guessing
    pub guessing: GuessingConfig,

    /// Values stored for required fields that neither tags nor path provide
    pub placeholders: PlaceholderConfig,

    /// Library settings
    pub library: LibraryConfig,
}

/// Path-based guessing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GuessingConfig {
    /// When false, blank fields go straight to placeholders
    pub enabled: bool,

    /// Filename regexes in priority order; the first match wins.
    /// Named capture groups must be called after the field they fill.
    pub patterns: Vec<String>,
}

impl Default for GuessingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: vec![
                r"^(?P<disc>\d+)[\.\-_:]+(?P<track_num>\d+)\s+(?P<title>.+)$".to_string(),
                r"^(?P<track_num>\d+)\s+(?P<title>.+)$".to_string(),
            ],
        }
    }
}

/// Placeholder ("fake null") tables
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaceholderConfig {
    pub track: TrackPlaceholders,
    pub album: AlbumPlaceholders,
}

/// Track-scoped placeholders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackPlaceholders {
    pub title: String,

    /// Must be negative: zero already reads as blank
    pub track_num: i64,

    pub disc: i64,
}

impl Default for TrackPlaceholders {
    fn default() -> Self {
        Self {
            title: "<Unknown Track>".to_string(),
            track_num: -1,
            disc: 1,
        }
    }
}

/// Album-scoped placeholders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlbumPlaceholders {
    pub title: String,
    pub artist: String,

    /// Stored as YYYY-MM-DD
    pub date: NaiveDate,

    pub disc_total: i64,
}

impl Default for AlbumPlaceholders {
    fn default() -> Self {
        Self {
            title: "Unknown Album".to_string(),
            artist: "Unknown Artist".to_string(),
            date: earliest_date(),
            disc_total: 1,
        }
    }
}

/// Library management settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibraryConfig {
    /// SQLite database file
    pub database: PathBuf,

    /// Audio file extensions picked up by import (case-insensitive)
    pub extensions: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(crate::db::DEFAULT_DB_NAME),
            extensions: crate::scanner::DEFAULT_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// 0001-01-01, the earliest calendar date tag formats agree on.
fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("path-tagger"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location.
///
/// Returns default config if the file doesn't exist or can't be parsed.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from an explicit path.
///
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "Loaded config");
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to an explicit path.
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
