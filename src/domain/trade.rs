use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::position::Side;

/// A closed round trip on the primary ticker
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub side: Side,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Gain/loss factor of the trade (1.0 = flat)
    pub return_multiple: f64,
    /// Time between entry and exit
    pub duration: TimeDelta,
}

impl Trade {
    /// Creates a closed trade, deriving the return multiple and holding time.
    ///
    /// Callers must have rejected a zero or non-finite entry price already.
    pub fn new(
        side: Side,
        entry_date: NaiveDate,
        exit_date: NaiveDate,
        entry_price: f64,
        exit_price: f64,
    ) -> Self {
        let return_multiple = match side {
            Side::Long => long_return(entry_price, exit_price),
            Side::Short => short_return(entry_price, exit_price),
        };
        Self {
            side,
            entry_date,
            exit_date,
            entry_price,
            exit_price,
            return_multiple,
            duration: exit_date - entry_date,
        }
    }

    pub fn is_win(&self) -> bool {
        self.return_multiple > 1.0
    }
}

/// Long return multiple: `exit / entry`
pub fn long_return(entry_price: f64, exit_price: f64) -> f64 {
    exit_price / entry_price
}

/// Short return multiple: `2 - exit / entry`.
///
/// This is a linear approximation of short P&L (the mirror of the long
/// multiple around 1.0), not the exact economics of borrowing and selling.
/// It goes non-positive once the exit price reaches twice the entry price.
pub fn short_return(entry_price: f64, exit_price: f64) -> f64 {
    2.0 - exit_price / entry_price
}

/// Subset of trades a statistic is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeFilter {
    All,
    Long,
    Short,
}

impl TradeFilter {
    pub fn matches(&self, side: Side) -> bool {
        match self {
            TradeFilter::All => true,
            TradeFilter::Long => side == Side::Long,
            TradeFilter::Short => side == Side::Short,
        }
    }
}

impl fmt::Display for TradeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeFilter::All => write!(f, "all"),
            TradeFilter::Long => write!(f, "long"),
            TradeFilter::Short => write!(f, "short"),
        }
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} {} @ {:.2} -> {} @ {:.2} = {:.4}x ({}d)",
            self.side,
            self.entry_date,
            self.entry_price,
            self.exit_date,
            self.exit_price,
            self.return_multiple,
            self.duration.num_days()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_long_trade() {
        let trade = Trade::new(Side::Long, day(5), day(6), 98.0, 100.0);
        assert_relative_eq!(trade.return_multiple, 100.0 / 98.0);
        assert_eq!(trade.duration, TimeDelta::days(1));
        assert!(trade.is_win());
    }

    #[test]
    fn test_short_trade_linear_approximation() {
        let trade = Trade::new(Side::Short, day(2), day(4), 102.0, 99.0);
        assert_relative_eq!(trade.return_multiple, 2.0 - 99.0 / 102.0);
        assert_relative_eq!(trade.return_multiple, 1.0294, epsilon = 1e-4);
        assert_eq!(trade.duration.num_days(), 2);
    }

    #[test]
    fn test_short_return_goes_non_positive_past_double() {
        assert_eq!(short_return(50.0, 100.0), 0.0);
        assert!(short_return(50.0, 120.0) < 0.0);
    }

    #[test]
    fn test_trade_filter() {
        assert!(TradeFilter::All.matches(Side::Long));
        assert!(TradeFilter::All.matches(Side::Short));
        assert!(TradeFilter::Long.matches(Side::Long));
        assert!(!TradeFilter::Long.matches(Side::Short));
        assert!(TradeFilter::Short.matches(Side::Short));
    }

    #[test]
    fn test_display_trade() {
        let trade = Trade::new(Side::Long, day(5), day(6), 98.0, 100.0);
        assert_eq!(
            format!("{}", trade),
            "Long 2024-01-05 @ 98.00 -> 2024-01-06 @ 100.00 = 1.0204x (1d)"
        );
    }
}
