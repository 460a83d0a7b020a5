//! Configuration management for uketsuke.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "uketsuke";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `UKETSUKE_`, sections separated
///    by `__`, e.g. `UKETSUKE_EXPORT__TZ_OFFSET_HOURS=0`)
/// 2. TOML config file at `~/.config/uketsuke/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Export configuration.
    pub export: ExportConfig,
    /// Email channel configuration.
    pub email: EmailConfig,
    /// Teams channel configuration.
    pub teams: TeamsConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the JSON blobs.
    /// Defaults to `~/.local/share/uketsuke`
    pub data_dir: Option<PathBuf>,
}

/// Export-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// UTC offset in hours applied when rendering timestamps.
    pub tz_offset_hours: i32,
}

/// Teams channel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamsConfig {
    /// Enable the Teams channel.
    pub enabled: bool,
    /// Webhook used when no department-specific channel matches.
    pub default_webhook: String,
    /// Department name to webhook URL.
    pub webhooks: HashMap<String, String>,
}

/// Email channel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Enable the email channel.
    pub enabled: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        // Timestamps render in JST unless configured otherwise
        Self { tz_offset_hours: 9 }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for TeamsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            default_webhook: String::new(),
            webhooks: HashMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `UKETSUKE_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("UKETSUKE_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if !(-12..=14).contains(&self.export.tz_offset_hours) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "tz_offset_hours ({}) must be between -12 and 14",
                    self.export.tz_offset_hours
                ),
            });
        }

        if self.teams.enabled
            && self.teams.default_webhook.is_empty()
            && self.teams.webhooks.is_empty()
        {
            return Err(Error::ConfigValidation {
                message: "teams channel is enabled but no webhook is configured".to_string(),
            });
        }

        Ok(())
    }

    /// Get the data directory, resolving defaults if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the configured UTC offset for rendering timestamps.
    #[must_use]
    pub fn tz_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.export.tz_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }
}
