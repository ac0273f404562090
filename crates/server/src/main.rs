//! Outbreak relay server.

use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod lobby;
mod registry;
mod server;
mod store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Outbreak Relay Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = config::Config::load()?;
    info!("Loaded configuration");
    info!("  Port: {}", config.server.port);
    info!("  World: {}x{}", config.game.world_size, config.game.world_size);
    info!("  Broadcast interval: {}ms", config.broadcast.interval_ms);
    info!("  Persistence: {}", config.persistence.backend);

    // Start the relay server
    server::run(config).await?;

    Ok(())
}
