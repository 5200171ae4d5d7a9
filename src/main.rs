//! Arena Game Server
//!
//! Serves one arena over WebSocket until Ctrl-C.

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use arena::{GameServer, ServerConfig, TICK_RATE, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Arena Server v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = ServerConfig::from_env()?;
    let server = Arc::new(GameServer::new(config)?);

    let signal_server = server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received");
                signal_server.shutdown().await;
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    server.run().await?;

    info!("Server stopped");
    Ok(())
}
