//! CSV price files
//!
//! Reads `<dir>/<SYMBOL>.csv` with a date column and a close column. Header
//! names are matched case-insensitively; `Adj Close` wins over `Close` when
//! both are present so exported Yahoo downloads work unchanged.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{PricePoint, PriceSeries};
use crate::ports::market_data::{lookback_start, MarketDataError, PriceHistoryPort};

#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }

    /// Read a whole price file, sorted by date
    pub fn read_file(symbol: &str, path: &Path) -> Result<PriceSeries, MarketDataError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        let headers = reader.headers()?.clone();

        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
        };
        let date_col = find(&["date", "timestamp"])
            .ok_or_else(|| MarketDataError::ResponseFormat(format!("{}: no date column", path.display())))?;
        let close_col = find(&["adj close", "adj_close", "adjclose"])
            .or_else(|| find(&["close"]))
            .ok_or_else(|| MarketDataError::ResponseFormat(format!("{}: no close column", path.display())))?;

        let mut points = Vec::new();
        for record in reader.records() {
            let record = record?;
            let (Some(raw_date), Some(raw_close)) = (record.get(date_col), record.get(close_col)) else {
                continue;
            };
            // Yahoo exports write "null" for missing sessions
            let Ok(close) = raw_close.parse::<f64>() else {
                tracing::debug!("{}: skipping unparsable close '{}'", symbol, raw_close);
                continue;
            };
            let date = parse_date(raw_date)
                .ok_or_else(|| MarketDataError::ResponseFormat(format!("{}: bad date '{}'", path.display(), raw_date)))?;
            points.push(PricePoint { date, close });
        }

        points.sort_by_key(|p| p.date);
        Ok(PriceSeries::new(symbol, points)?)
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // accept "2024-01-02" and "2024-01-02 00:00:00-05:00"
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

#[async_trait]
impl PriceHistoryPort for CsvPriceSource {
    async fn fetch_closes(&self, symbol: &str, lookback_years: u32) -> Result<PriceSeries, MarketDataError> {
        let path = self.path_for(symbol);

        // file reads are blocking, keep them off the runtime workers
        let full = {
            let symbol = symbol.to_string();
            let path = path.clone();
            tokio::task::spawn_blocking(move || {
                if !path.exists() {
                    return Err(MarketDataError::SymbolNotFound(format!("{} ({})", symbol, path.display())));
                }
                Self::read_file(&symbol, &path)
            })
            .await
            .map_err(|e| MarketDataError::Task(format!("Task join error: {}", e)))??
        };
        let Some(end) = full.last_date() else {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        };
        let start = lookback_start(end, lookback_years);

        let points = full.points().iter().copied().filter(|p| p.date >= start).collect();
        tracing::info!("Loaded {} closes since {} from {}", symbol, start, path.display());
        Ok(PriceSeries::new(symbol, points)?)
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}
