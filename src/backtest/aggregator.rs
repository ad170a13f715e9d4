//! Aggregator
//!
//! Reduces the spread frame, detected signals, and backtest outcome into
//! the flat `pair_stats` record used for reporting.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::backtest::simulator::BacktestOutcome;
use crate::domain::signal::{Extreme, BAND_LOWER, BAND_UPPER};
use crate::domain::TradeFilter;
use crate::strategy::detector::SignalSeries;
use crate::strategy::spread::SpreadFrame;

const DAYS_PER_YEAR: f64 = 365.25;

/// Summary statistics for one (ticker1, ticker2) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairStats {
    pub ticker1: String,
    pub ticker2: String,
    /// Mean ticker1 momentum while spread >= 1
    pub ticker1_mean_std_p1: Option<f64>,
    /// Mean ticker1 momentum while spread <= -1
    pub ticker1_mean_std_n1: Option<f64>,
    pub ticker1_mean_diff: Option<f64>,
    pub ticker2_mean_std_p1: Option<f64>,
    pub ticker2_mean_std_n1: Option<f64>,
    pub ticker2_mean_diff: Option<f64>,
    /// Entry events per year of defined spread history
    pub sdv_cross_per_year: f64,
    pub long_entries: usize,
    pub short_entries: usize,
    pub return_all: f64,
    pub return_long: f64,
    pub return_short: f64,
    #[serde(with = "whole_days")]
    pub time_in_market_all: TimeDelta,
    #[serde(with = "whole_days")]
    pub time_in_market_long: TimeDelta,
    #[serde(with = "whole_days")]
    pub time_in_market_short: TimeDelta,
}

/// Build the summary record
pub fn aggregate(frame: &SpreadFrame, signals: &SignalSeries, outcome: &BacktestOutcome) -> PairStats {
    let (t1_p1, t1_n1) = regime_means(&frame.spread, &frame.primary_momentum);
    let (t2_p1, t2_n1) = regime_means(&frame.spread, &frame.secondary_momentum);

    PairStats {
        ticker1: frame.primary_symbol.clone(),
        ticker2: frame.secondary_symbol.clone(),
        ticker1_mean_std_p1: t1_p1,
        ticker1_mean_std_n1: t1_n1,
        ticker1_mean_diff: t1_p1.zip(t1_n1).map(|(p, n)| p - n),
        ticker2_mean_std_p1: t2_p1,
        ticker2_mean_std_n1: t2_n1,
        ticker2_mean_diff: t2_p1.zip(t2_n1).map(|(p, n)| p - n),
        sdv_cross_per_year: crosses_per_year(frame, signals),
        // low extreme entries open longs, high extreme entries open shorts
        long_entries: signals.entry_count(Extreme::Low),
        short_entries: signals.entry_count(Extreme::High),
        return_all: outcome.cumulative_return(TradeFilter::All),
        return_long: outcome.cumulative_return(TradeFilter::Long),
        return_short: outcome.cumulative_return(TradeFilter::Short),
        time_in_market_all: outcome.time_in_market(TradeFilter::All),
        time_in_market_long: outcome.time_in_market(TradeFilter::Long),
        time_in_market_short: outcome.time_in_market(TradeFilter::Short),
    }
}

/// Mean momentum where spread >= 1 and where spread <= -1
fn regime_means(spread: &[Option<f64>], momentum: &[Option<f64>]) -> (Option<f64>, Option<f64>) {
    let conditioned = |keep: fn(f64) -> bool| -> Option<f64> {
        let values: Vec<f64> = spread
            .iter()
            .zip(momentum)
            .filter_map(|(s, m)| match (s, m) {
                (Some(s), Some(m)) if keep(*s) && !m.is_nan() => Some(*m),
                _ => None,
            })
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().mean())
        }
    };

    (
        conditioned(|s| s >= BAND_UPPER),
        conditioned(|s| s <= BAND_LOWER),
    )
}

fn crosses_per_year(frame: &SpreadFrame, signals: &SignalSeries) -> f64 {
    let span_days = frame
        .spread_series()
        .ok()
        .and_then(|s| s.defined_span())
        .map(|(first, last)| (last - first).num_days())
        .unwrap_or(0);
    if span_days <= 0 {
        return 0.0;
    }
    signals.total_entries() as f64 / (span_days as f64 / DAYS_PER_YEAR)
}

mod whole_days {
    use chrono::TimeDelta;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_days())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let days = i64::deserialize(deserializer)?;
        TimeDelta::try_days(days).ok_or_else(|| D::Error::custom(format!("{} days out of range", days)))
    }
}
