//! Analysis Parameters
//!
//! Window lengths for the spread and the history depth to request.
//! Defaults are 60 trading days of momentum standardized over 240 days,
//! on four years of history.

use serde::{Deserialize, Serialize};

/// Main analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Number of daily returns summed into each momentum value
    pub momentum_window: usize,
    /// Number of momentum differences used for the rolling mean/std
    pub zscore_window: usize,
    /// Years of price history to request from the data source
    pub lookback_years: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            momentum_window: 60,
            zscore_window: 240,
            lookback_years: 4,
        }
    }
}

impl AnalysisConfig {
    /// Create a new config with custom momentum window
    pub fn with_momentum_window(mut self, window: usize) -> Self {
        self.momentum_window = window;
        self
    }

    /// Create a new config with custom z-score window
    pub fn with_zscore_window(mut self, window: usize) -> Self {
        self.zscore_window = window;
        self
    }

    pub fn with_lookback_years(mut self, years: u32) -> Self {
        self.lookback_years = years;
        self
    }

    /// Number of leading observations that can never carry a spread value
    pub fn warmup_len(&self) -> usize {
        // one bar lost to pct_change, then both windows must fill
        self.momentum_window + self.zscore_window - 1
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.momentum_window == 0 {
            return Err(ConfigError::InvalidMomentumWindow(self.momentum_window));
        }
        if self.zscore_window < 2 {
            return Err(ConfigError::InvalidZScoreWindow(self.zscore_window));
        }
        if self.lookback_years == 0 || self.lookback_years > 50 {
            return Err(ConfigError::InvalidLookbackYears(self.lookback_years));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid momentum window: {0} (minimum 1)")]
    InvalidMomentumWindow(usize),
    #[error("Invalid z-score window: {0} (minimum 2)")]
    InvalidZScoreWindow(usize),
    #[error("Invalid lookback: {0} years (must be 1-50)")]
    InvalidLookbackYears(u32),
}
