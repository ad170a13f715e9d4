use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::trade::Trade;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

/// Simulated position on the primary ticker
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Flat,
    LongOpen { entry_price: f64, entry_date: NaiveDate },
    ShortOpen { entry_price: f64, entry_date: NaiveDate },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PositionError {
    #[error("Position is already open since {0}")]
    AlreadyOpen(NaiveDate),
    #[error("No open position to close")]
    NotOpen,
    #[error("Invalid {side:?} entry price {price} on {date}")]
    InvalidEntryPrice { side: Side, price: f64, date: NaiveDate },
    #[error("Invalid {side:?} exit price {price} on {date}")]
    InvalidExitPrice { side: Side, price: f64, date: NaiveDate },
}

impl Position {
    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            Position::Flat => None,
            Position::LongOpen { .. } => Some(Side::Long),
            Position::ShortOpen { .. } => Some(Side::Short),
        }
    }

    pub fn entry_date(&self) -> Option<NaiveDate> {
        match *self {
            Position::Flat => None,
            Position::LongOpen { entry_date, .. } | Position::ShortOpen { entry_date, .. } => {
                Some(entry_date)
            }
        }
    }

    /// Open a position. The price is recorded as given; it is validated on close
    /// so that an unusable entry still consumes its matching exit.
    pub fn open(&mut self, side: Side, entry_price: f64, entry_date: NaiveDate) -> Result<(), PositionError> {
        if let Some(since) = self.entry_date() {
            return Err(PositionError::AlreadyOpen(since));
        }
        *self = match side {
            Side::Long => Position::LongOpen { entry_price, entry_date },
            Side::Short => Position::ShortOpen { entry_price, entry_date },
        };
        Ok(())
    }

    /// Close the position and produce the trade. The position is Flat afterwards
    /// even when the trade is rejected.
    pub fn close(&mut self, exit_price: f64, exit_date: NaiveDate) -> Result<Trade, PositionError> {
        let (side, entry_price, entry_date) = match std::mem::take(self) {
            Position::Flat => return Err(PositionError::NotOpen),
            Position::LongOpen { entry_price, entry_date } => (Side::Long, entry_price, entry_date),
            Position::ShortOpen { entry_price, entry_date } => (Side::Short, entry_price, entry_date),
        };

        if !entry_price.is_finite() || entry_price <= 0.0 {
            return Err(PositionError::InvalidEntryPrice {
                side,
                price: entry_price,
                date: entry_date,
            });
        }
        if !exit_price.is_finite() || exit_price <= 0.0 {
            return Err(PositionError::InvalidExitPrice {
                side,
                price: exit_price,
                date: exit_date,
            });
        }

        Ok(Trade::new(side, entry_date, exit_date, entry_price, exit_price))
    }
}
