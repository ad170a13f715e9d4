//! Report export
//!
//! JSON for the `pair_stats` record, CSV for the trade tape, and the plain
//! text summary printed by the CLI.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::application::PairReport;
use crate::backtest::PairStats;
use crate::domain::{Side, Trade};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Output was not valid UTF-8")]
    Utf8,
}

#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    side: &'a str,
    entry_date: String,
    exit_date: String,
    entry_price: f64,
    exit_price: f64,
    return_multiple: f64,
    duration_days: i64,
}

impl<'a> From<&'a Trade> for TradeRow<'a> {
    fn from(trade: &'a Trade) -> Self {
        Self {
            side: match trade.side {
                Side::Long => "long",
                Side::Short => "short",
            },
            entry_date: trade.entry_date.to_string(),
            exit_date: trade.exit_date.to_string(),
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            return_multiple: trade.return_multiple,
            duration_days: trade.duration.num_days(),
        }
    }
}

pub fn stats_to_json(stats: &PairStats) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(stats)?)
}

/// Trades as CSV with a header row
pub fn trades_to_csv(trades: &[Trade]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    for trade in trades {
        writer.serialize(TradeRow::from(trade))?;
    }
    // header is only written with the first record
    if trades.is_empty() {
        writer.write_record([
            "side",
            "entry_date",
            "exit_date",
            "entry_price",
            "exit_price",
            "return_multiple",
            "duration_days",
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|_| ExportError::Utf8)
}

pub fn write_file(path: &Path, content: &str) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:+.4}", v)).unwrap_or_else(|| "n/a".to_string())
}

/// Multi-line human readable summary
pub fn render_summary(report: &PairReport) -> String {
    let s = &report.stats;
    let mut out = String::new();

    let _ = writeln!(out, "Pair: {} vs {}", s.ticker1, s.ticker2);
    let _ = writeln!(out, "  Entries: {} long / {} short ({:.2} per year)", s.long_entries, s.short_entries, s.sdv_cross_per_year);
    let _ = writeln!(
        out,
        "  {} momentum: {} at +1 / {} at -1 (diff {})",
        s.ticker1,
        fmt_opt(s.ticker1_mean_std_p1),
        fmt_opt(s.ticker1_mean_std_n1),
        fmt_opt(s.ticker1_mean_diff)
    );
    let _ = writeln!(
        out,
        "  {} momentum: {} at +1 / {} at -1 (diff {})",
        s.ticker2,
        fmt_opt(s.ticker2_mean_std_p1),
        fmt_opt(s.ticker2_mean_std_n1),
        fmt_opt(s.ticker2_mean_diff)
    );
    let _ = writeln!(out, "  Return   all {:.4}x  long {:.4}x  short {:.4}x", s.return_all, s.return_long, s.return_short);
    let _ = writeln!(
        out,
        "  In market all {}d  long {}d  short {}d",
        s.time_in_market_all.num_days(),
        s.time_in_market_long.num_days(),
        s.time_in_market_short.num_days()
    );

    if let Some(since) = report.open_position.entry_date() {
        let _ = writeln!(out, "  Open position since {} (not counted)", since);
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "  warning: {}", warning);
    }

    out
}

/// One line per pair for scans
pub fn render_scan_line(stats: &PairStats) -> String {
    format!(
        "{:<8} vs {:<6} entries {:>3}L/{:>3}S  return {:.4}x  in market {:>5}d",
        stats.ticker1,
        stats.ticker2,
        stats.long_entries,
        stats.short_entries,
        stats.return_all,
        stats.time_in_market_all.num_days()
    )
}
