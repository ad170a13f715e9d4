//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, the analysis core never fetches data
//! itself. Price history arrives through `PriceHistoryPort`, implemented by
//! the adapters (Yahoo chart API, CSV files).

pub mod market_data;

pub use market_data::{lookback_start, MarketDataError, PriceHistoryPort};
