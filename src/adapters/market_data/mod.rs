//! Market Data Adapters
//!
//! Implementations of `PriceHistoryPort`:
//! - `YahooChartClient`: Yahoo Finance v8 chart API (daily closes)
//! - `CsvPriceSource`: local `<SYMBOL>.csv` files for offline runs

mod csv_file;
mod yahoo;

pub use csv_file::CsvPriceSource;
pub use yahoo::{YahooChartClient, YahooConfig};
