use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use thiserror::Error;

use crate::domain::{PriceSeries, SeriesError};

/// Market data error type
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status} for '{symbol}'")]
    Status { symbol: String, status: u16 },

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Unexpected response format: {0}")]
    ResponseFormat(String),

    #[error("Failed to read price file: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid price series: {0}")]
    Series(#[from] SeriesError),

    #[error("Price loading task failed: {0}")]
    Task(String),
}

/// Source of daily closing prices
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceHistoryPort: Send + Sync {
    /// Fetch daily closes for `symbol` covering the last `lookback_years`
    async fn fetch_closes(&self, symbol: &str, lookback_years: u32)
        -> Result<PriceSeries, MarketDataError>;

    /// Short name for logging
    fn name(&self) -> &'static str;
}

/// First date of a lookback window ending at `end`
pub fn lookback_start(end: NaiveDate, lookback_years: u32) -> NaiveDate {
    end.checked_sub_months(Months::new(lookback_years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookback_start() {
        let end = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(lookback_start(end, 4), NaiveDate::from_ymd_opt(2022, 10, 18).unwrap());
    }

    #[test]
    fn test_lookback_start_leap_day() {
        let end = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(lookback_start(end, 1), NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
    }

    #[test]
    fn test_port_is_object_safe() {
        let mut mock = MockPriceHistoryPort::new();
        mock.expect_name().return_const("mock");
        mock.expect_fetch_closes().returning(|symbol, _| {
            PriceSeries::from_pairs(symbol, [(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 10.0)])
                .map_err(MarketDataError::from)
        });

        let port: Box<dyn PriceHistoryPort> = Box::new(mock);
        let series = tokio_test::block_on(port.fetch_closes("AMD", 1)).unwrap();
        assert_eq!(series.symbol(), "AMD");
        assert_eq!(port.name(), "mock");
    }
}
