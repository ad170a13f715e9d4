//! Domain Layer - Core types for pair spread analysis
//!
//! Pure value types with no I/O:
//! - `series`: date-ordered price and spread series
//! - `signal`: band constants and Entry/Exit events
//! - `position`: the simulated position state machine
//! - `trade`: closed trades and return-multiple formulas

pub mod series;
pub mod signal;
pub mod position;
pub mod trade;

pub use series::{PricePoint, PriceSeries, SeriesError, SpreadPoint, SpreadSeries};
pub use signal::{Extreme, SignalEvent, SignalKind};
pub use position::{Position, PositionError, Side};
pub use trade::{Trade, TradeFilter};
