//! CLI Command Handlers
//!
//! Implementation of all CLI commands for pair-reversion.

use clap::{Args, Parser, Subcommand, ValueEnum};
use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::adapters::export;
use crate::adapters::market_data::{CsvPriceSource, YahooChartClient};
use crate::application::PairAnalysisService;
use crate::config::{load_config_or_default, Config, DataSourceKind};
use crate::ports::PriceHistoryPort;
use crate::strategy::AnalysisConfig;

/// pair-reversion - spread mean-reversion signals and backtests for ticker pairs
#[derive(Parser, Debug)]
#[command(
    name = "pair-reversion",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Spread mean-reversion signals and backtests for ticker pairs",
    long_about = "Builds the z-score of relative rolling momentum between two tickers, \
                  detects band crossings, and backtests them on the first ticker."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one ticker against the secondary and print pair_stats
    Analyze(AnalyzeCmd),

    /// Analyze several tickers against the secondary concurrently
    Scan(ScanCmd),

    /// Print the trade tape for one pair
    Trades(TradesCmd),
}

impl Command {
    fn source(&self) -> &SourceArgs {
        match self {
            Command::Analyze(cmd) => &cmd.source,
            Command::Scan(cmd) => &cmd.source,
            Command::Trades(cmd) => &cmd.source,
        }
    }
}

/// Data source and window overrides shared by every command
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Path to configuration file (defaults apply when missing)
    #[arg(short, long, value_name = "FILE", default_value = "config/pair-reversion.toml")]
    pub config: PathBuf,

    /// Secondary ticker (default from config, usually SPY)
    #[arg(short, long, value_name = "TICKER")]
    pub against: Option<String>,

    /// Years of history to use
    #[arg(short, long, value_name = "YEARS")]
    pub years: Option<u32>,

    /// Price source override
    #[arg(long, value_enum)]
    pub source: Option<DataSourceKind>,

    /// Directory of <SYMBOL>.csv files (implies --source csv)
    #[arg(long, value_name = "DIR")]
    pub csv_dir: Option<PathBuf>,

    /// Override momentum window
    #[arg(long, value_name = "DAYS")]
    pub momentum_window: Option<usize>,

    /// Override z-score window
    #[arg(long, value_name = "DAYS")]
    pub zscore_window: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Analyze one pair
#[derive(Parser, Debug)]
pub struct AnalyzeCmd {
    /// Primary ticker (e.g., AMD)
    #[arg(value_name = "TICKER")]
    pub ticker: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write pair_stats JSON to a file
    #[arg(long, value_name = "FILE")]
    pub export_json: Option<PathBuf>,

    /// Write the trade tape CSV to a file
    #[arg(long, value_name = "FILE")]
    pub export_trades: Option<PathBuf>,
}

/// Scan many pairs
#[derive(Parser, Debug)]
pub struct ScanCmd {
    /// Primary tickers
    #[arg(value_name = "TICKER", required = true, num_args = 1..)]
    pub tickers: Vec<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Trade tape
#[derive(Parser, Debug)]
pub struct TradesCmd {
    /// Primary ticker
    #[arg(value_name = "TICKER")]
    pub ticker: String,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Config file merged with command-line overrides
#[derive(Debug, Clone)]
pub struct Settings {
    pub analysis: AnalysisConfig,
    pub source: DataSourceKind,
    pub csv_dir: PathBuf,
    pub against: String,
    pub log_level: String,
}

impl Settings {
    pub fn resolve(config: &Config, args: &SourceArgs) -> Result<Self> {
        let mut analysis = AnalysisConfig::from(config);
        if let Some(years) = args.years {
            analysis = analysis.with_lookback_years(years);
        }
        if let Some(window) = args.momentum_window {
            analysis = analysis.with_momentum_window(window);
        }
        if let Some(window) = args.zscore_window {
            analysis = analysis.with_zscore_window(window);
        }
        analysis.validate().context("Invalid analysis parameters")?;

        let source = match (args.source, &args.csv_dir) {
            (Some(kind), _) => kind,
            (None, Some(_)) => DataSourceKind::Csv,
            (None, None) => config.data.source,
        };

        Ok(Self {
            analysis,
            source,
            csv_dir: args.csv_dir.clone().unwrap_or_else(|| config.data.get_csv_dir()),
            against: args.against.clone().unwrap_or_else(|| config.data.secondary.clone()),
            log_level: config.logging.level.clone(),
        })
    }
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let source_args = app.command.source().clone();
    let config = load_config_or_default(&source_args.config)
        .with_context(|| format!("Failed to load configuration from {}", source_args.config.display()))?;
    let settings = Settings::resolve(&config, &source_args)?;

    // Initialize logging based on flags
    init_logging(app.verbose, app.debug, &settings.log_level)?;

    match settings.source {
        DataSourceKind::Yahoo => {
            let client = YahooChartClient::new().context("Failed to create Yahoo client")?;
            dispatch(PairAnalysisService::new(client, settings.analysis.clone()), &settings, app.command).await
        }
        DataSourceKind::Csv => {
            let source = CsvPriceSource::new(&settings.csv_dir);
            dispatch(PairAnalysisService::new(source, settings.analysis.clone()), &settings, app.command).await
        }
    }
}

async fn dispatch<P: PriceHistoryPort + 'static>(
    service: PairAnalysisService<P>,
    settings: &Settings,
    command: Command,
) -> Result<()> {
    match command {
        Command::Analyze(cmd) => analyze_command(&service, settings, cmd).await,
        Command::Scan(cmd) => scan_command(&service, settings, cmd).await,
        Command::Trades(cmd) => trades_command(&service, settings, cmd).await,
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, config_level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        config_level
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Handle analyze command
async fn analyze_command<P: PriceHistoryPort + 'static>(
    service: &PairAnalysisService<P>,
    settings: &Settings,
    cmd: AnalyzeCmd,
) -> Result<()> {
    let report = service
        .analyze(&cmd.ticker, &settings.against)
        .await
        .with_context(|| format!("Analysis of {} vs {} failed", cmd.ticker, settings.against))?;

    match cmd.format {
        OutputFormat::Json => println!("{}", export::stats_to_json(&report.stats)?),
        OutputFormat::Text => print!("{}", export::render_summary(&report)),
    }

    if let Some(ref path) = cmd.export_json {
        export::write_file(path, &export::stats_to_json(&report.stats)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("pair_stats written to {}", path.display());
    }

    if let Some(ref path) = cmd.export_trades {
        export::write_file(path, &export::trades_to_csv(&report.trades)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("{} trades written to {}", report.trades.len(), path.display());
    }

    Ok(())
}

/// Handle scan command
async fn scan_command<P: PriceHistoryPort + 'static>(
    service: &PairAnalysisService<P>,
    settings: &Settings,
    cmd: ScanCmd,
) -> Result<()> {
    let results = service
        .scan(&cmd.tickers, &settings.against)
        .await
        .with_context(|| format!("Failed to load secondary {}", settings.against))?;

    let mut failures = 0;
    for (ticker, result) in results {
        match result {
            Ok(report) => println!("{}", export::render_scan_line(&report.stats)),
            Err(e) => {
                failures += 1;
                println!("{:<8} failed: {}", ticker, e);
            }
        }
    }

    if failures > 0 {
        tracing::warn!("{} of {} pairs failed", failures, cmd.tickers.len());
    }

    Ok(())
}

/// Handle trades command
async fn trades_command<P: PriceHistoryPort + 'static>(
    service: &PairAnalysisService<P>,
    settings: &Settings,
    cmd: TradesCmd,
) -> Result<()> {
    let report = service
        .analyze(&cmd.ticker, &settings.against)
        .await
        .with_context(|| format!("Analysis of {} vs {} failed", cmd.ticker, settings.against))?;

    if report.trades.is_empty() {
        println!("No closed trades for {} vs {}", cmd.ticker, settings.against);
    }
    for trade in &report.trades {
        println!("{}", trade);
    }
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }

    Ok(())
}
