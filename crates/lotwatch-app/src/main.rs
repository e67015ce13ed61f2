//! lotwatch - live parking occupancy client.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Live parking occupancy client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via LOTWATCH_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Lot to open in the detail view, overriding the config file
    #[arg(long)]
    lot: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before any wss:// connection
    lotwatch_ws::init_crypto();

    let args = Args::parse();

    lotwatch_telemetry::init_logging()?;

    info!("Starting lotwatch v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > LOTWATCH_CONFIG > default
    let config_path = args
        .config
        .or_else(|| std::env::var("LOTWATCH_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let mut config = lotwatch_app::AppConfig::from_file(&config_path)?;
    if let Some(lot) = args.lot {
        config.select_lot = Some(lotwatch_core::LotId::new(lot));
    }
    info!(api_url = %config.api_url, ws_url = %config.ws_url, "Configuration loaded");

    let app = lotwatch_app::Application::new(config)?;
    app.run().await?;

    Ok(())
}
