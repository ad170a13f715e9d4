//! Application Layer
//!
//! Use cases wiring the strategy and backtest layers to a price source.

pub mod analyzer;

pub use analyzer::{analyze_pair, AnalysisError, PairAnalysisService, PairReport};
