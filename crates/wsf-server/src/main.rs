//! # WS-Federation Bridge Server
//!
//! Main entry point for the WS-Federation bridge.

#![forbid(unsafe_code)]
#![deny(warnings)]

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsf_server::{Server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("WS-Federation bridge starting...");

    let server = Server::new(config).await?;
    server.run().await
}
