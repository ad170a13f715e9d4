//! Backtest Simulator
//!
//! Replays merged Entry/Exit events against the primary ticker's closes,
//! one position at a time. Entries at the low extreme go long, entries at
//! the high extreme go short, and the next Exit closes whatever is open.

use chrono::{NaiveDate, TimeDelta};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::signal::{Extreme, SignalEvent, SignalKind};
use crate::domain::{Position, PositionError, PriceSeries, Side, Trade, TradeFilter};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BacktestError {
    #[error("No '{symbol}' price on {date}: event index is not aligned with the price series")]
    UnalignedIndex { symbol: String, date: NaiveDate },
    #[error("Event contract violated on {date}: {reason}")]
    ContractViolation { date: NaiveDate, reason: String },
}

/// Non-fatal conditions; the affected trade is dropped
#[derive(Debug, Clone, PartialEq)]
pub enum BacktestWarning {
    InvalidEntryPrice {
        side: Side,
        entry_date: NaiveDate,
        exit_date: NaiveDate,
        price: f64,
    },
    InvalidExitPrice {
        side: Side,
        exit_date: NaiveDate,
        price: f64,
    },
}

impl fmt::Display for BacktestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BacktestWarning::InvalidEntryPrice {
                side,
                entry_date,
                exit_date,
                price,
            } => write!(
                f,
                "{:?} trade {} -> {} dropped: invalid entry price {}",
                side, entry_date, exit_date, price
            ),
            BacktestWarning::InvalidExitPrice {
                side,
                exit_date,
                price,
            } => write!(
                f,
                "{:?} trade closing {} dropped: invalid exit price {}",
                side, exit_date, price
            ),
        }
    }
}

/// Closed trades and diagnostics from one replay
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BacktestOutcome {
    /// Closed trades in chronological order
    pub trades: Vec<Trade>,
    pub warnings: Vec<BacktestWarning>,
    /// Position still open when the events ran out (never counted)
    pub open_position: Position,
}

impl BacktestOutcome {
    pub fn trades_for(&self, filter: TradeFilter) -> impl Iterator<Item = &Trade> + '_ {
        self.trades.iter().filter(move |t| filter.matches(t.side))
    }

    pub fn trade_count(&self, filter: TradeFilter) -> usize {
        self.trades_for(filter).count()
    }

    /// Product of return multiples; 1.0 when the subset has no trades
    pub fn cumulative_return(&self, filter: TradeFilter) -> f64 {
        if self.trade_count(filter) == 0 {
            return 1.0;
        }
        self.trades_for(filter).map(|t| t.return_multiple).product()
    }

    /// Summed holding time; zero when the subset has no trades
    pub fn time_in_market(&self, filter: TradeFilter) -> TimeDelta {
        if self.trade_count(filter) == 0 {
            return TimeDelta::zero();
        }
        self.trades_for(filter)
            .fold(TimeDelta::zero(), |acc, t| acc + t.duration)
    }
}

/// Event replay over one primary price series
#[derive(Debug, Clone, Copy)]
pub struct BacktestSimulator<'a> {
    prices: &'a PriceSeries,
}

impl<'a> BacktestSimulator<'a> {
    pub fn new(prices: &'a PriceSeries) -> Self {
        Self { prices }
    }

    /// Replay events in ascending date order
    pub fn run(&self, events: &[SignalEvent]) -> Result<BacktestOutcome, BacktestError> {
        let mut outcome = BacktestOutcome::default();
        let mut position = Position::Flat;
        let mut last_date: Option<NaiveDate> = None;

        for event in events {
            if last_date.is_some_and(|d| event.date <= d) {
                return Err(violation(event.date, "events are not in ascending date order"));
            }
            last_date = Some(event.date);

            let price = self.price_at(event.date)?;

            match event.kind {
                SignalKind::Entry => {
                    let side = match event.extreme() {
                        Some(Extreme::Low) => Side::Long,
                        Some(Extreme::High) => Side::Short,
                        None => {
                            return Err(violation(
                                event.date,
                                format!("entry value {} lies inside the band", event.value),
                            ))
                        }
                    };
                    position.open(side, price, event.date).map_err(|e| violation(event.date, e.to_string()))?;
                    debug!(date = %event.date, ?side, price, "position opened");
                }
                SignalKind::Exit => {
                    match position.close(price, event.date) {
                        Ok(trade) => {
                            debug!(%trade, "position closed");
                            outcome.trades.push(trade);
                        }
                        Err(PositionError::NotOpen) => {
                            return Err(violation(event.date, "exit without an open position"));
                        }
                        Err(PositionError::InvalidEntryPrice { side, price: bad, date }) => {
                            let warning = BacktestWarning::InvalidEntryPrice {
                                side,
                                entry_date: date,
                                exit_date: event.date,
                                price: bad,
                            };
                            warn!("{}", warning);
                            outcome.warnings.push(warning);
                        }
                        Err(PositionError::InvalidExitPrice { side, price: bad, date }) => {
                            let warning = BacktestWarning::InvalidExitPrice {
                                side,
                                exit_date: date,
                                price: bad,
                            };
                            warn!("{}", warning);
                            outcome.warnings.push(warning);
                        }
                        Err(e @ PositionError::AlreadyOpen(_)) => {
                            return Err(violation(event.date, e.to_string()));
                        }
                    }
                }
            }
        }

        if let Some(since) = position.entry_date() {
            info!(%since, "position still open at end of history, not counted");
        }
        outcome.open_position = position;

        Ok(outcome)
    }

    fn price_at(&self, date: NaiveDate) -> Result<f64, BacktestError> {
        self.prices
            .price_at(date)
            .ok_or_else(|| BacktestError::UnalignedIndex {
                symbol: self.prices.symbol().to_string(),
                date,
            })
    }
}

fn violation(date: NaiveDate, reason: impl Into<String>) -> BacktestError {
    BacktestError::ContractViolation {
        date,
        reason: reason.into(),
    }
}
