//! Application state management.
//!
//! This module defines the shared state that is passed to all request handlers.

use std::sync::Arc;

use wsf_protocol::endpoints::WsFedState;

use crate::config::ServerConfig;
use crate::providers::Providers;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,

    /// File and memory backed providers.
    pub providers: Arc<Providers>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: ServerConfig, providers: Arc<Providers>) -> Self {
        Self { config, providers }
    }

    /// Gets the WS-Federation state for the protocol endpoints.
    pub fn wsfed_state(&self) -> WsFedState {
        WsFedState::new(
            self.config.wsfed_config(),
            self.providers.relying_parties.clone(),
            self.providers.sessions.clone(),
            self.providers.keys.clone(),
        )
    }

    /// Returns the server configuration.
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }
}
