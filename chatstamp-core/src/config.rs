//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/chatstamp/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/chatstamp/` (~/.config/chatstamp/)
//! - State/Logs: `$XDG_STATE_HOME/chatstamp/` (~/.local/state/chatstamp/)

use crate::error::{Error, Result};
use crate::timestamp::{parse_utc_offset, DisplayPolicy, HourCycle, NaiveZone};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Timestamp rendering
    #[serde(default)]
    pub timestamps: TimestampConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Timestamp rendering configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TimestampConfig {
    /// "absolute" or "relative"
    #[serde(default)]
    pub policy: DisplayPolicy,

    /// How timestamps without an offset are read: "utc" or "local"
    #[serde(default)]
    pub naive_zone: NaiveZone,

    /// "12h" or "24h"
    #[serde(default)]
    pub hour_cycle: HourCycle,

    /// Returned for missing or unparseable timestamps
    #[serde(default)]
    pub fallback: String,

    /// Fixed viewer offset such as "-05:00" (local timezone when unset)
    pub utc_offset: Option<String>,

    /// Reinterpret naive timestamps that land in the future as local time
    #[serde(default)]
    pub correct_future_skew: bool,

    /// How far in the future a timestamp may be before it is corrected
    #[serde(default = "default_future_tolerance")]
    pub future_tolerance_secs: u64,
}

impl Default for TimestampConfig {
    fn default() -> Self {
        Self {
            policy: DisplayPolicy::default(),
            naive_zone: NaiveZone::default(),
            hour_cycle: HourCycle::default(),
            fallback: String::new(),
            utc_offset: None,
            correct_future_skew: false,
            future_tolerance_secs: default_future_tolerance(),
        }
    }
}

impl TimestampConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if let Some(offset) = &self.utc_offset {
            parse_utc_offset(offset).map_err(|_| {
                Error::Config(format!(
                    "timestamps.utc_offset must look like \"+HH:MM\", got {:?}",
                    offset
                ))
            })?;
        }
        if self.future_tolerance_secs > i64::MAX as u64 / 1000 {
            return Err(Error::Config(
                "timestamps.future_tolerance_secs is too large".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_future_tolerance() -> u64 {
    60
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.timestamps.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/chatstamp/config.toml` (~/.config/chatstamp/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("chatstamp").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/chatstamp/` (~/.local/state/chatstamp/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("chatstamp")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/chatstamp/chatstamp.log` (~/.local/state/chatstamp/chatstamp.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("chatstamp.log")
    }
}
