//! Date-indexed series
//!
//! `PriceSeries` holds closing prices for one ticker, `SpreadSeries` holds the
//! standardized spread. Both enforce strictly ascending, unique dates at
//! construction so every downstream pass can walk them in order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeriesError {
    #[error("Series '{symbol}' is not strictly ascending at {date}")]
    Unordered { symbol: String, date: NaiveDate },
    #[error("Series length mismatch: {dates} dates vs {values} values")]
    LengthMismatch { dates: usize, values: usize },
}

/// A single closing price observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Closing prices for one ticker, ordered by trading day
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if let Some(bad) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(SeriesError::Unordered {
                symbol,
                date: bad[1].date,
            });
        }
        Ok(Self { symbol, points })
    }

    /// Build from `(date, close)` pairs
    pub fn from_pairs<I>(symbol: impl Into<String>, pairs: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let points = pairs
            .into_iter()
            .map(|(date, close)| PricePoint { date, close })
            .collect();
        Self::new(symbol, points)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Closing price on an exact date, if the series has one
    pub fn price_at(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].close)
    }
}

/// One spread observation; `None` while the rolling windows warm up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl SpreadPoint {
    /// The value when it is present and not NaN
    pub fn defined(&self) -> Option<f64> {
        self.value.filter(|v| !v.is_nan())
    }
}

/// Standardized spread (z-score) between two tickers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpreadSeries {
    points: Vec<SpreadPoint>,
}

impl SpreadSeries {
    pub fn new(points: Vec<SpreadPoint>) -> Result<Self, SeriesError> {
        if let Some(bad) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(SeriesError::Unordered {
                symbol: "spread".to_string(),
                date: bad[1].date,
            });
        }
        Ok(Self { points })
    }

    /// Zip aligned dates and values into a series
    pub fn from_parts(dates: &[NaiveDate], values: &[Option<f64>]) -> Result<Self, SeriesError> {
        if dates.len() != values.len() {
            return Err(SeriesError::LengthMismatch {
                dates: dates.len(),
                values: values.len(),
            });
        }
        let points = dates
            .iter()
            .zip(values)
            .map(|(&date, &value)| SpreadPoint { date, value })
            .collect();
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[SpreadPoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpreadPoint> + '_ {
        self.points.iter()
    }

    /// First and last dates carrying a defined value
    pub fn defined_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut defined = self.points.iter().filter(|p| p.defined().is_some());
        let first = defined.next()?.date;
        let last = defined.last().map(|p| p.date).unwrap_or(first);
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_price_series_ordered() {
        let series =
            PriceSeries::from_pairs("AMD", vec![(day(2), 10.0), (day(3), 11.0), (day(5), 12.0)])
                .unwrap();
        assert_eq!(series.symbol(), "AMD");
        assert_eq!(series.len(), 3);
        assert_eq!(series.first_date(), Some(day(2)));
        assert_eq!(series.last_date(), Some(day(5)));
    }

    #[test]
    fn test_price_series_rejects_duplicate_dates() {
        let result = PriceSeries::from_pairs("AMD", vec![(day(2), 10.0), (day(2), 11.0)]);
        assert!(matches!(result, Err(SeriesError::Unordered { date, .. }) if date == day(2)));
    }

    #[test]
    fn test_price_series_rejects_descending_dates() {
        let result = PriceSeries::from_pairs("SPY", vec![(day(4), 10.0), (day(3), 11.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_price_lookup() {
        let series =
            PriceSeries::from_pairs("AMD", vec![(day(2), 10.0), (day(3), 11.0), (day(5), 12.0)])
                .unwrap();
        assert_eq!(series.price_at(day(3)), Some(11.0));
        assert_eq!(series.price_at(day(4)), None);
    }

    #[test]
    fn test_spread_point_nan_is_undefined() {
        let point = SpreadPoint {
            date: day(1),
            value: Some(f64::NAN),
        };
        assert_eq!(point.defined(), None);
    }

    #[test]
    fn test_spread_from_parts_length_mismatch() {
        let result = SpreadSeries::from_parts(&[day(1), day(2)], &[Some(1.0)]);
        assert!(matches!(
            result,
            Err(SeriesError::LengthMismatch { dates: 2, values: 1 })
        ));
    }

    #[test]
    fn test_defined_span_skips_warmup() {
        let spread = SpreadSeries::from_parts(
            &[day(1), day(2), day(3), day(4)],
            &[None, Some(0.5), Some(-0.2), None],
        )
        .unwrap();
        assert_eq!(spread.defined_span(), Some((day(2), day(3))));
    }

    #[test]
    fn test_defined_span_empty() {
        let spread = SpreadSeries::from_parts(&[day(1)], &[None]).unwrap();
        assert_eq!(spread.defined_span(), None);
    }
}
