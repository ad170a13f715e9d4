//! pair-reversion - Spread mean-reversion signals and backtests for ticker pairs

use anyhow::Result;
use pair_reversion::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (PAIR_REVERSION_CSV_DIR, RUST_LOG)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
