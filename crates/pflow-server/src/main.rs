use anyhow::{Context, Result};
use pflow_server::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Config file path: first argument, else PFLOW_CONFIG
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PFLOW_CONFIG").ok());

    let config = ServerConfig::load(path.as_deref()).context("Failed to load configuration")?;

    pflow_monitoring::init_logging(&config.telemetry.monitoring_config())
        .context("Failed to initialize logging")?;

    pflow_server::run(config).await.context("Server error")?;

    Ok(())
}
