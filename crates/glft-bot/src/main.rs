//! GLFT market-making bot entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// GLFT market-making bot.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via GLFT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // CLI arg > GLFT_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("GLFT_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = glft_bot::AppConfig::load(&config_path)?;
    glft_telemetry::init_logging(config.telemetry.log_format)?;

    info!("starting glft-bot v{}", env!("CARGO_PKG_VERSION"));
    info!(config_path = %config_path, mode = ?config.mode, "configuration loaded");

    let app = glft_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
