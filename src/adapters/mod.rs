//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits and the outer surfaces:
//! - Market Data: Yahoo chart API and local CSV price files
//! - Export: pair_stats JSON, trade CSV, text summaries
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod export;
pub mod market_data;

pub use cli::CliApp;
pub use market_data::{CsvPriceSource, YahooChartClient, YahooConfig};
