//! TSN Predictor - Main Entry Point

use anyhow::Context;
use tracing::info;
use tsn_api::{init_logging, run_server, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_logging(&config.log_level, config.log_format)?;

    info!("=== TSN Predictor v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Artifacts: {}, assets: {}",
        config.artifact_dir.display(),
        config.asset_dir.display()
    );

    run_server(config).await
}
