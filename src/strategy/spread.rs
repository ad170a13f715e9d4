//! Spread Builder
//!
//! Turns two closing-price series into the standardized spread:
//!
//! 1. join both series on date
//! 2. daily percentage change per ticker
//! 3. momentum = rolling sum of the changes over `momentum_window`
//! 4. diff = momentum(primary) - momentum(secondary)
//! 5. spread = z-score of diff over `zscore_window`
//!
//! Warm-up positions are `None` rather than NaN.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use crate::domain::{PriceSeries, SeriesError, SpreadSeries};
use crate::strategy::params::{AnalysisConfig, ConfigError};
use crate::strategy::zscore_gate::{RollingSum, ZScoreGate};

#[derive(Debug, Error)]
pub enum SpreadError {
    #[error("Invalid window: {0}")]
    InvalidWindow(#[from] ConfigError),
    #[error("Series error: {0}")]
    Series(#[from] SeriesError),
}

/// Date-aligned output of the spread builder
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadFrame {
    pub primary_symbol: String,
    pub secondary_symbol: String,
    pub dates: Vec<NaiveDate>,
    /// Primary closes on the joined dates
    pub primary_close: Vec<f64>,
    /// Rolling momentum of the primary ticker
    pub primary_momentum: Vec<Option<f64>>,
    /// Rolling momentum of the secondary ticker
    pub secondary_momentum: Vec<Option<f64>>,
    /// Z-score of the momentum difference
    pub spread: Vec<Option<f64>>,
}

impl SpreadFrame {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The spread column as an ordered series
    pub fn spread_series(&self) -> Result<SpreadSeries, SeriesError> {
        SpreadSeries::from_parts(&self.dates, &self.spread)
    }

    /// Primary closes restricted to the joined dates
    pub fn primary_prices(&self) -> Result<PriceSeries, SeriesError> {
        PriceSeries::from_pairs(
            self.primary_symbol.clone(),
            self.dates.iter().copied().zip(self.primary_close.iter().copied()),
        )
    }
}

/// Builds spread frames for a fixed pair of window lengths
#[derive(Debug, Clone)]
pub struct SpreadBuilder {
    config: AnalysisConfig,
}

impl SpreadBuilder {
    pub fn new(config: AnalysisConfig) -> Result<Self, SpreadError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn build(&self, primary: &PriceSeries, secondary: &PriceSeries) -> SpreadFrame {
        let joined = inner_join(primary, secondary);
        let dropped = primary.len() + secondary.len() - 2 * joined.len();
        if dropped > 0 {
            debug!(
                dropped,
                primary = primary.symbol(),
                secondary = secondary.symbol(),
                "dates present in only one series were dropped"
            );
        }

        let primary_close: Vec<f64> = joined.iter().map(|&(_, p, _)| p).collect();
        let secondary_close: Vec<f64> = joined.iter().map(|&(_, _, s)| s).collect();

        let primary_momentum = self.momentum(&primary_close);
        let secondary_momentum = self.momentum(&secondary_close);

        let mut gate = ZScoreGate::new(self.config.zscore_window);
        let spread = primary_momentum
            .iter()
            .zip(&secondary_momentum)
            .map(|(a, b)| {
                let diff = a.zip(*b).map(|(a, b)| a - b);
                gate.update(diff).map(|z| z.z_score)
            })
            .collect::<Vec<_>>();

        debug!(
            rows = joined.len(),
            defined = spread.iter().filter(|v| v.is_some()).count(),
            "spread built"
        );

        SpreadFrame {
            primary_symbol: primary.symbol().to_string(),
            secondary_symbol: secondary.symbol().to_string(),
            dates: joined.iter().map(|&(d, _, _)| d).collect(),
            primary_close,
            primary_momentum,
            secondary_momentum,
            spread,
        }
    }

    /// Rolling sum of daily percentage changes
    fn momentum(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let mut rolling = RollingSum::new(self.config.momentum_window);
        let mut previous: Option<f64> = None;

        closes
            .iter()
            .map(|&close| {
                let change = previous.map(|prev| close / prev - 1.0);
                previous = Some(close);
                rolling.update(change)
            })
            .collect()
    }
}

/// Merge-join two ascending series on date
fn inner_join(primary: &PriceSeries, secondary: &PriceSeries) -> Vec<(NaiveDate, f64, f64)> {
    let a = primary.points();
    let b = secondary.points();
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].date.cmp(&b[j].date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push((a[i].date, a[i].close, b[j].close));
                i += 1;
                j += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::TimeDelta::days(n)
    }

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        PriceSeries::from_pairs(
            symbol,
            closes.iter().enumerate().map(|(i, &c)| (day(i as i64), c)),
        )
        .unwrap()
    }

    fn small_builder() -> SpreadBuilder {
        SpreadBuilder::new(
            AnalysisConfig::default()
                .with_momentum_window(2)
                .with_zscore_window(3),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_window() {
        let result = SpreadBuilder::new(AnalysisConfig::default().with_zscore_window(1));
        assert!(matches!(result, Err(SpreadError::InvalidWindow(_))));
    }

    #[test]
    fn test_momentum_is_rolling_sum_of_changes() {
        let builder = small_builder();
        let frame = builder.build(
            &series("A", &[100.0, 110.0, 121.0, 121.0]),
            &series("B", &[50.0, 50.0, 50.0, 50.0]),
        );
        assert_eq!(frame.primary_momentum[0], None);
        assert_eq!(frame.primary_momentum[1], None);
        assert_relative_eq!(frame.primary_momentum[2].unwrap(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(frame.primary_momentum[3].unwrap(), 0.1, epsilon = 1e-12);
        assert_eq!(frame.secondary_momentum[3], Some(0.0));
    }

    #[test]
    fn test_warmup_length_matches_config() {
        let builder = small_builder();
        let closes: Vec<f64> = (0..12).map(|i| 100.0 + ((i * 7) % 5) as f64).collect();
        let flat: Vec<f64> = (0..12).map(|i| 80.0 + ((i * 3) % 4) as f64).collect();
        let frame = builder.build(&series("A", &closes), &series("B", &flat));

        let warmup = builder.config().warmup_len();
        assert!(frame.spread[..warmup].iter().all(|v| v.is_none()));
        assert!(frame.spread[warmup].is_some());
    }

    #[test]
    fn test_spread_matches_manual_zscore() {
        let builder = small_builder();
        let a = [100.0, 102.0, 101.0, 105.0, 104.0, 108.0];
        let b = [50.0, 50.5, 50.2, 50.1, 50.6, 50.3];
        let frame = builder.build(&series("A", &a), &series("B", &b));

        let pct = |x: &[f64], i: usize| x[i] / x[i - 1] - 1.0;
        let diff = |i: usize| (pct(&a, i) + pct(&a, i - 1)) - (pct(&b, i) + pct(&b, i - 1));
        let window = [diff(3), diff(4), diff(5)];
        let mean = window.iter().sum::<f64>() / 3.0;
        let var = window.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / 2.0;
        let expected = (window[2] - mean) / var.sqrt();

        assert_relative_eq!(frame.spread[5].unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_inner_join_drops_unmatched_dates() {
        let primary =
            PriceSeries::from_pairs("A", vec![(day(0), 1.0), (day(1), 2.0), (day(3), 3.0)]).unwrap();
        let secondary =
            PriceSeries::from_pairs("B", vec![(day(1), 5.0), (day(2), 6.0), (day(3), 7.0)]).unwrap();
        let frame = small_builder().build(&primary, &secondary);

        assert_eq!(frame.dates, vec![day(1), day(3)]);
        assert_eq!(frame.primary_close, vec![2.0, 3.0]);
        assert_eq!(frame.primary_prices().unwrap().price_at(day(3)), Some(3.0));
    }

    #[test]
    fn test_short_history_is_all_undefined() {
        let frame = small_builder().build(&series("A", &[1.0, 2.0]), &series("B", &[1.0, 2.0]));
        assert_eq!(frame.len(), 2);
        assert!(frame.spread.iter().all(|v| v.is_none()));
        assert_eq!(frame.spread_series().unwrap().defined_span(), None);
    }
}
