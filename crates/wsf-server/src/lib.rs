//! # wsf-server
//!
//! Axum server hosting the WS-Federation bridge.
//!
//! This crate provides the HTTP server combining:
//! - WS-Federation passive requestor endpoints (sign-in, sign-out, metadata)
//! - A development login page backed by a JSON user directory
//! - Health check endpoints
//!
//! ## Architecture
//!
//! The protocol endpoints only talk to the collaborator traits defined in
//! `wsf-protocol`. This crate supplies file and memory backed
//! implementations of them and wires everything into one router.
//!
//! ## Usage
//!
//! ```ignore
//! use wsf_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config).await?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod providers;
pub mod router;
pub mod state;
pub mod ui;

pub use config::ServerConfig;
pub use router::create_router;
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::providers::Providers;

/// The WS-Federation bridge server.
pub struct Server {
    config: ServerConfig,
    providers: Arc<Providers>,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// This loads the signing keys, relying parties and users named in the
    /// configuration.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let providers = Providers::from_config(&config)?;

        tracing::info!(
            issuer = %config.issuer,
            signing_key = providers.keys.snapshot().is_some(),
            "Providers loaded"
        );

        Ok(Self {
            config,
            providers: Arc::new(providers),
        })
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        self.serve(listener).await
    }

    /// Serves on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let app = self.test_router();

        tracing::info!("Server listening on http://{}", listener.local_addr()?);

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the loaded providers.
    #[must_use]
    pub fn providers(&self) -> &Arc<Providers> {
        &self.providers
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Creates a router without starting the server.
    ///
    /// This is useful for integration testing.
    pub fn test_router(&self) -> Router {
        let state = AppState::new(self.config.clone(), self.providers.clone());
        create_router(state)
    }
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
