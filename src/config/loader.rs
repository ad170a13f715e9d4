//! Configuration Loader
//!
//! Loads and validates configuration from TOML files. Every section and
//! field has a default, so an empty file (or no file) is a valid config.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisSection,
    pub data: DataSection,
    pub logging: LoggingSection,
}

/// Spread window configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// Trading days summed into each momentum value
    pub momentum_window: usize,
    /// Trading days used for the rolling mean/std of the momentum difference
    pub zscore_window: usize,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            momentum_window: 60,
            zscore_window: 240,
        }
    }
}

/// Where prices come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    Yahoo,
    Csv,
}

/// Price data configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// "yahoo" or "csv"
    pub source: DataSourceKind,
    /// Years of daily history to request
    pub lookback_years: u32,
    /// Directory holding `<SYMBOL>.csv` files when `source = "csv"`
    pub csv_dir: String,
    /// Ticker the primary is measured against
    pub secondary: String,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            source: DataSourceKind::Yahoo,
            lookback_years: 4,
            csv_dir: "data".to_string(),
            secondary: "SPY".to_string(),
        }
    }
}

impl DataSection {
    /// CSV directory with `PAIR_REVERSION_CSV_DIR` override and `~` expansion
    pub fn get_csv_dir(&self) -> PathBuf {
        let raw = std::env::var("PAIR_REVERSION_CSV_DIR").unwrap_or_else(|_| self.csv_dir.clone());
        PathBuf::from(shellexpand::tilde(&raw).to_string())
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load the file when it exists, otherwise fall back to defaults
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        tracing::debug!("No config at {}, using defaults", path.as_ref().display());
        Ok(Config::default())
    }
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::strategy::params::AnalysisConfig::from(self)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.data.secondary.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "secondary ticker cannot be empty".to_string(),
            ));
        }

        if self.data.source == DataSourceKind::Csv && self.data.csv_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "csv_dir cannot be empty when source = \"csv\"".to_string(),
            ));
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging level must be one of {:?}, got {}",
                LEVELS, self.logging.level
            )));
        }

        Ok(())
    }
}

// Conversion from Config to AnalysisConfig
impl From<&Config> for crate::strategy::params::AnalysisConfig {
    fn from(config: &Config) -> Self {
        crate::strategy::params::AnalysisConfig {
            momentum_window: config.analysis.momentum_window,
            zscore_window: config.analysis.zscore_window,
            lookback_years: config.data.lookback_years,
        }
    }
}
