//! Pair Analyzer
//!
//! `analyze_pair` is the pure pipeline:
//! prices -> spread -> signals -> backtest -> pair_stats.
//!
//! `PairAnalysisService` wraps it with price retrieval through a
//! `PriceHistoryPort` and runs independent pairs concurrently.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::backtest::{aggregate, BacktestError, BacktestSimulator, BacktestWarning, PairStats};
use crate::domain::{Position, PriceSeries, SeriesError, Trade};
use crate::ports::market_data::{MarketDataError, PriceHistoryPort};
use crate::strategy::{AnalysisConfig, SignalDetector, SignalSeries, SpreadBuilder, SpreadError};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Spread error: {0}")]
    Spread(#[from] SpreadError),
    #[error("Series error: {0}")]
    Series(#[from] SeriesError),
    #[error("Backtest failed for {ticker1}/{ticker2}: {source}")]
    Backtest {
        ticker1: String,
        ticker2: String,
        #[source]
        source: BacktestError,
    },
    #[error("Failed to fetch {symbol}: {source}")]
    MarketData {
        symbol: String,
        #[source]
        source: MarketDataError,
    },
    #[error("Analysis task for {0} did not complete")]
    Task(String),
}

/// Everything produced for one pair
#[derive(Debug, Clone)]
pub struct PairReport {
    pub stats: PairStats,
    pub trades: Vec<Trade>,
    pub warnings: Vec<BacktestWarning>,
    pub signals: SignalSeries,
    /// Position left open at the end of history
    pub open_position: Position,
}

/// Run the full pipeline on two price series
pub fn analyze_pair(
    primary: &PriceSeries,
    secondary: &PriceSeries,
    config: &AnalysisConfig,
) -> Result<PairReport, AnalysisError> {
    let builder = SpreadBuilder::new(config.clone())?;
    let frame = builder.build(primary, secondary);

    let signals = SignalDetector::detect(&frame.spread_series()?);
    let events = signals.events();
    info!(
        ticker1 = primary.symbol(),
        ticker2 = secondary.symbol(),
        rows = frame.len(),
        events = events.len(),
        "signals detected"
    );

    let prices = frame.primary_prices()?;
    let outcome = BacktestSimulator::new(&prices)
        .run(&events)
        .map_err(|source| AnalysisError::Backtest {
            ticker1: primary.symbol().to_string(),
            ticker2: secondary.symbol().to_string(),
            source,
        })?;

    let stats = aggregate(&frame, &signals, &outcome);
    info!(
        ticker1 = %stats.ticker1,
        ticker2 = %stats.ticker2,
        trades = outcome.trades.len(),
        return_all = stats.return_all,
        "pair analyzed"
    );

    Ok(PairReport {
        stats,
        trades: outcome.trades,
        warnings: outcome.warnings,
        signals,
        open_position: outcome.open_position,
    })
}

/// Fetch-and-analyze service over a price source
pub struct PairAnalysisService<P> {
    port: Arc<P>,
    config: AnalysisConfig,
}

impl<P> Clone for PairAnalysisService<P> {
    fn clone(&self) -> Self {
        Self {
            port: Arc::clone(&self.port),
            config: self.config.clone(),
        }
    }
}

impl<P> PairAnalysisService<P>
where
    P: PriceHistoryPort + 'static,
{
    pub fn new(port: P, config: AnalysisConfig) -> Self {
        Self {
            port: Arc::new(port),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    async fn fetch(&self, symbol: &str) -> Result<PriceSeries, AnalysisError> {
        self.port
            .fetch_closes(symbol, self.config.lookback_years)
            .await
            .map_err(|source| AnalysisError::MarketData {
                symbol: symbol.to_string(),
                source,
            })
    }

    /// Fetch both tickers and analyze the pair
    pub async fn analyze(&self, ticker1: &str, ticker2: &str) -> Result<PairReport, AnalysisError> {
        info!("Analyzing {} against {} via {}", ticker1, ticker2, self.port.name());
        let (primary, secondary) = tokio::try_join!(self.fetch(ticker1), self.fetch(ticker2))?;
        analyze_pair(&primary, &secondary, &self.config)
    }

    /// Analyze many tickers against one secondary, each pair in its own task.
    ///
    /// Results come back in input order; one failing pair does not stop the rest.
    pub async fn scan(
        &self,
        tickers: &[String],
        against: &str,
    ) -> Result<Vec<(String, Result<PairReport, AnalysisError>)>, AnalysisError> {
        let secondary = Arc::new(self.fetch(against).await?);
        let mut tasks = JoinSet::new();

        for (index, ticker) in tickers.iter().enumerate() {
            let service = self.clone();
            let secondary = Arc::clone(&secondary);
            let ticker = ticker.clone();
            tasks.spawn(async move {
                let result = match service.fetch(&ticker).await {
                    Ok(primary) => analyze_pair(&primary, &secondary, &service.config),
                    Err(e) => Err(e),
                };
                (index, ticker, result)
            });
        }

        let mut slots: Vec<Option<(String, Result<PairReport, AnalysisError>)>> =
            (0..tickers.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, ticker, result)) => slots[index] = Some((ticker, result)),
                Err(e) => warn!("scan task failed: {}", e),
            }
        }

        Ok(slots
            .into_iter()
            .zip(tickers)
            .map(|(slot, ticker)| {
                slot.unwrap_or_else(|| (ticker.clone(), Err(AnalysisError::Task(ticker.clone()))))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::market_data::MockPriceHistoryPort;
    use chrono::{NaiveDate, TimeDelta};
    use mockall::predicate::eq;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + TimeDelta::days(n)
    }

    fn wave(symbol: &str, n: usize, phase: f64) -> PriceSeries {
        PriceSeries::from_pairs(
            symbol,
            (0..n).map(|i| {
                let x = i as f64 / 9.0 + phase;
                (day(i as i64), 100.0 + 8.0 * x.sin() + 0.05 * i as f64)
            }),
        )
        .unwrap()
    }

    fn small_config() -> AnalysisConfig {
        AnalysisConfig::default()
            .with_momentum_window(5)
            .with_zscore_window(20)
    }

    #[test]
    fn test_analyze_pair_produces_consistent_report() {
        let report = analyze_pair(&wave("AMD", 300, 0.0), &wave("SPY", 300, 1.3), &small_config()).unwrap();

        let stats = &report.stats;
        assert_eq!(stats.ticker1, "AMD");
        assert_eq!(stats.ticker2, "SPY");
        assert_eq!(stats.long_entries + stats.short_entries, report.signals.total_entries());
        assert!(stats.long_entries + stats.short_entries > 0);
        approx::assert_relative_eq!(stats.return_all, stats.return_long * stats.return_short, epsilon = 1e-12);
        assert!(report.trades.windows(2).all(|w| w[0].exit_date <= w[1].entry_date));
    }

    #[test]
    fn test_analyze_pair_rejects_bad_config() {
        let result = analyze_pair(
            &wave("AMD", 10, 0.0),
            &wave("SPY", 10, 0.0),
            &AnalysisConfig::default().with_zscore_window(0),
        );
        assert!(matches!(result, Err(AnalysisError::Spread(_))));
    }

    #[tokio::test]
    async fn test_service_fetches_both_tickers() {
        let mut port = MockPriceHistoryPort::new();
        port.expect_name().return_const("mock");
        port.expect_fetch_closes()
            .with(eq("AMD"), eq(4u32))
            .times(1)
            .returning(|_, _| Ok(wave("AMD", 200, 0.0)));
        port.expect_fetch_closes()
            .with(eq("SPY"), eq(4u32))
            .times(1)
            .returning(|_, _| Ok(wave("SPY", 200, 2.0)));

        let service = PairAnalysisService::new(port, small_config());
        let report = service.analyze("AMD", "SPY").await.unwrap();
        assert_eq!(report.stats.ticker1, "AMD");
    }

    #[tokio::test]
    async fn test_service_surfaces_fetch_failure() {
        let mut port = MockPriceHistoryPort::new();
        port.expect_name().return_const("mock");
        port.expect_fetch_closes()
            .returning(|symbol, _| Err(MarketDataError::SymbolNotFound(symbol.to_string())));

        let service = PairAnalysisService::new(port, small_config());
        let err = service.analyze("ZZZZ", "SPY").await.unwrap_err();
        assert!(matches!(err, AnalysisError::MarketData { .. }));
    }

    #[tokio::test]
    async fn test_scan_keeps_order_and_isolates_failures() {
        let mut port = MockPriceHistoryPort::new();
        port.expect_name().return_const("mock");
        port.expect_fetch_closes().returning(|symbol, _| match symbol {
            "SPY" => Ok(wave("SPY", 200, 2.0)),
            "BAD" => Err(MarketDataError::SymbolNotFound("BAD".to_string())),
            other => Ok(wave(other, 200, 0.5)),
        });

        let service = PairAnalysisService::new(port, small_config());
        let tickers = vec!["AMD".to_string(), "BAD".to_string(), "NVDA".to_string()];
        let results = service.scan(&tickers, "SPY").await.unwrap();

        let names: Vec<_> = results.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(names, vec!["AMD", "BAD", "NVDA"]);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(results[2].1.is_ok());
    }
}
