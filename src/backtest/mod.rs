//! Backtest Layer
//!
//! Replays detected events on the primary ticker and reduces the result
//! into the `pair_stats` summary record.

pub mod simulator;
pub mod aggregator;

pub use simulator::{BacktestError, BacktestOutcome, BacktestSimulator, BacktestWarning};
pub use aggregator::{aggregate, PairStats};
