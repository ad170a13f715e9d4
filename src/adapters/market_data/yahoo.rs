//! Yahoo Finance chart API client
//!
//! Fetches daily closes from the v8 chart endpoint. Null closes (holidays,
//! halted sessions) are skipped; a duplicated trailing date, which Yahoo
//! emits for the live session, keeps the newest value.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::domain::{PricePoint, PriceSeries};
use crate::ports::market_data::{lookback_start, MarketDataError, PriceHistoryPort};

const YAHOO_CHART_API: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

/// Yahoo client configuration
#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub api_base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            api_base_url: YAHOO_CHART_API.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct YahooChartClient {
    config: YahooConfig,
    http: Client,
}

impl YahooChartClient {
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_config(YahooConfig::default())
    }

    pub fn with_config(config: YahooConfig) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { config, http })
    }

    /// Get daily closes between `start` and now
    pub async fn get_daily_closes(&self, symbol: &str, start: NaiveDate) -> Result<PriceSeries, MarketDataError> {
        let url = format!("{}/{}", self.config.api_base_url, symbol);
        let period1 = start.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp()).unwrap_or(0);
        let period2 = Utc::now().timestamp();

        let request = self.http.get(&url).query(&[
            ("period1", period1.to_string()),
            ("period2", period2.to_string()),
            ("interval", "1d".to_string()),
            ("events", "history".to_string()),
        ]);

        let response = self.execute_with_retry(symbol, &request).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }
        if !status.is_success() {
            return Err(MarketDataError::Status {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let chart: ChartResponse = response.json().await?;
        parse_chart(symbol, chart)
    }

    /// Execute request with retry logic and rate limit handling
    async fn execute_with_retry(
        &self,
        symbol: &str,
        request: &reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, MarketDataError> {
        let mut last_error = None;

        for attempt in 0..self.config.max_retries {
            let req = request
                .try_clone()
                .ok_or_else(|| MarketDataError::ResponseFormat("request body not clonable".into()))?;

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    // Handle rate limiting (429) with exponential backoff
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let backoff = Duration::from_secs(2u64.pow(attempt + 1));
                        tracing::warn!(
                            "Rate limited (429) fetching {}, backing off for {:?} (attempt {}/{})",
                            symbol,
                            backoff,
                            attempt + 1,
                            self.config.max_retries
                        );
                        last_error = Some(MarketDataError::Status {
                            symbol: symbol.to_string(),
                            status: status.as_u16(),
                        });
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    // Retry on server errors (5xx)
                    if status.is_server_error() {
                        last_error = Some(MarketDataError::Status {
                            symbol: symbol.to_string(),
                            status: status.as_u16(),
                        });
                        tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(e) => {
                    tracing::debug!("request for {} failed: {}", symbol, e);
                    last_error = Some(MarketDataError::Http(e));
                    tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| MarketDataError::ResponseFormat("max retries exceeded".into())))
    }
}

#[async_trait]
impl PriceHistoryPort for YahooChartClient {
    async fn fetch_closes(&self, symbol: &str, lookback_years: u32) -> Result<PriceSeries, MarketDataError> {
        let start = lookback_start(Utc::now().date_naive(), lookback_years);
        tracing::info!("Fetching {} daily closes from Yahoo since {}", symbol, start);
        self.get_daily_closes(symbol, start).await
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

fn parse_chart(symbol: &str, response: ChartResponse) -> Result<PriceSeries, MarketDataError> {
    let data = match (response.chart.result, response.chart.error) {
        (_, Some(err)) if err.code == "Not Found" => {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()))
        }
        (_, Some(err)) => {
            return Err(MarketDataError::ResponseFormat(format!("{}: {}", err.code, err.description)))
        }
        (Some(result), None) => result
            .into_iter()
            .next()
            .ok_or_else(|| MarketDataError::ResponseFormat("result array is empty".into()))?,
        (None, None) => return Err(MarketDataError::ResponseFormat("empty result with no error".into())),
    };

    let timestamps = data.timestamp.unwrap_or_default();
    let closes = data
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .ok_or_else(|| MarketDataError::ResponseFormat("no quote data".into()))?;

    let mut points: Vec<PricePoint> = Vec::with_capacity(timestamps.len());
    for (ts, close) in timestamps.iter().zip(closes) {
        let Some(close) = close else { continue };
        let date = chrono::DateTime::from_timestamp(*ts, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| MarketDataError::ResponseFormat(format!("invalid timestamp: {}", ts)))?;

        match points.last_mut() {
            Some(last) if last.date == date => last.close = close,
            _ => points.push(PricePoint { date, close }),
        }
    }

    if points.is_empty() {
        return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
    }

    Ok(PriceSeries::new(symbol, points)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<PriceSeries, MarketDataError> {
        parse_chart("AMD", serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_client_creation() {
        assert!(YahooChartClient::new().is_ok());
    }

    #[test]
    fn test_parse_skips_null_closes() {
        // 2024-01-02, 2024-01-03, 2024-01-04 at 14:30 UTC
        let json = r#"{"chart":{"result":[{"timestamp":[1704205800,1704292200,1704378600],
            "indicators":{"quote":[{"close":[138.58,null,135.73]}]}}],"error":null}}"#;
        let series = parse(json).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.price_at(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()),
            Some(135.73)
        );
    }

    #[test]
    fn test_parse_duplicate_trailing_date_keeps_latest() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704205800,1704229200],
            "indicators":{"quote":[{"close":[138.0,139.5]}]}}],"error":null}}"#;
        let series = parse(json).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.points()[0].close, 139.5);
    }

    #[test]
    fn test_parse_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        assert!(matches!(parse(json), Err(MarketDataError::SymbolNotFound(s)) if s == "AMD"));
    }

    #[test]
    fn test_parse_other_error() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"oops"}}}"#;
        assert!(matches!(parse(json), Err(MarketDataError::ResponseFormat(_))));
    }

    #[test]
    fn test_parse_all_null_is_not_found() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704205800],
            "indicators":{"quote":[{"close":[null]}]}}],"error":null}}"#;
        assert!(matches!(parse(json), Err(MarketDataError::SymbolNotFound(_))));
    }
}
