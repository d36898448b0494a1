//! Configuration management for keypad timing
//!
//! Debounce and hold thresholds are scanner policy, so they live in a config
//! file rather than in code. The file is optional; missing values fall back
//! to defaults.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/keypad-state/config.toml` |
//! | macOS | `~/Library/Application Support/keypad-state/config.toml` |
//! | Windows | `%APPDATA%\keypad-state\config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use keypad_state::Config;
//!
//! let mut config = Config::load_or_default();
//! config.timing.hold_ms = 750;
//! config.save().expect("Failed to save config");
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize config
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Hold threshold does not exceed the debounce window
    #[error("hold_ms ({hold_ms}) must be greater than debounce_ms ({debounce_ms})")]
    InvalidTiming { debounce_ms: u32, hold_ms: u32 },
}

/// Returns the path to the config file.
///
/// Creates the config directory if it doesn't exist.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    config_path_in(&config_dir)
}

/// Path to the config file under an arbitrary base directory.
///
/// Creates `<base>/keypad-state` if it doesn't exist.
pub fn config_path_in(base: &Path) -> Result<PathBuf, ConfigError> {
    let app_dir = base.join("keypad-state");

    if !app_dir.exists() {
        fs::create_dir_all(&app_dir)?;
    }

    Ok(app_dir.join("config.toml"))
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Debounce and hold thresholds
    #[serde(default)]
    pub timing: TimingConfig,
}

/// Timing thresholds for key transitions, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Minimum dwell in a state before a raw change is trusted
    pub debounce_ms: u32,
    /// Dwell in Pressed before promotion to Hold
    pub hold_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 10,
            hold_ms: 500,
        }
    }
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_if_present(&config_path()?)
    }

    /// Like [`Config::load_from`], but a missing file yields the defaults
    pub fn load_if_present(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(path)
    }

    /// Like [`Config::load`], but logs the failure and falls back to defaults
    pub fn load_or_default() -> Self {
        match config_path() {
            Ok(path) => Self::load_or_default_from(&path),
            Err(e) => {
                log::warn!("no usable config path, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load from `path`, logging any failure and falling back to defaults
    pub fn load_or_default_from(path: &Path) -> Self {
        Self::load_if_present(path).unwrap_or_else(|e| {
            log::warn!(
                "failed to load config from {}, using defaults: {}",
                path.display(),
                e
            );
            Self::default()
        })
    }

    /// Load and validate configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        log::debug!(
            "loaded config from {}: debounce={}ms hold={}ms",
            path.display(),
            config.timing.debounce_ms,
            config.timing.hold_ms
        );
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

    /// Check that the thresholds can produce every state.
    ///
    /// A hold threshold at or below the debounce window would promote to
    /// Hold before a press is even accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let TimingConfig {
            debounce_ms,
            hold_ms,
        } = self.timing;
        if hold_ms <= debounce_ms {
            return Err(ConfigError::InvalidTiming {
                debounce_ms,
                hold_ms,
            });
        }
        Ok(())
    }
}
