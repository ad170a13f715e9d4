//! pair-reversion - Spread mean-reversion analysis for ticker pairs
//!
//! Builds a standardized spread from the relative rolling momentum of two
//! tickers, detects crossings of the ±1 bands, and backtests the resulting
//! entries and exits on the first ticker.
//!
//! # Modules
//!
//! - `domain`: Core value types (PriceSeries, SignalEvent, Position, Trade)
//! - `ports`: Trait abstractions (PriceHistoryPort)
//! - `strategy`: Spread construction and band-crossing detection
//! - `backtest`: Trade simulation and pair_stats aggregation
//! - `adapters`: External implementations (Yahoo, CSV, export, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Pair analysis use cases

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod backtest;
pub mod adapters;
pub mod config;
pub mod application;
