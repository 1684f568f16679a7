//! Drowsiness Monitor - Main Entry Point

use std::path::PathBuf;

use api::{init_logging, run_server, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref())?;
    init_logging(&settings.server)?;

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Starting drowsiness monitoring service...");

    run_server(settings).await?;

    Ok(())
}
