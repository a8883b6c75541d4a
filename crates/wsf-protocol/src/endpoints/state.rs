//! WS-Federation endpoint state and the collaborators it depends on.

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue};

use crate::error::WsFedError;
use crate::signature::{KeyRing, KeySet};
use crate::types::{AuthenticatedSession, RelyingParty, WSFED_ENDPOINT_PATH};

/// Identity provider settings the endpoints need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsFedConfig {
    /// Issuer name placed in tokens and metadata (`entityID`).
    pub issuer: String,
    /// Absolute URL of the passive requestor endpoint.
    pub endpoint_url: String,
    /// Path (optionally with a query) of the login page.
    pub login_path: String,
    /// Where sign-out lands when no reply URL is validated.
    pub post_logout_redirect: String,
}

impl WsFedConfig {
    /// Derives the settings from a public base URL.
    #[must_use]
    pub fn from_base_url(issuer: impl Into<String>, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            issuer: issuer.into(),
            endpoint_url: format!("{base}{WSFED_ENDPOINT_PATH}"),
            login_path: "/account/login".to_string(),
            post_logout_redirect: "/".to_string(),
        }
    }

    /// Overrides the login page path.
    #[must_use]
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    /// Overrides the post-logout landing location.
    #[must_use]
    pub fn with_post_logout_redirect(mut self, location: impl Into<String>) -> Self {
        self.post_logout_redirect = location.into();
        self
    }
}

/// WS-Federation endpoint state.
///
/// Holds the configuration and the collaborators the endpoints consult.
#[derive(Clone)]
pub struct WsFedState {
    /// Identity provider settings.
    pub config: Arc<WsFedConfig>,
    /// Relying party registrations.
    pub relying_parties: Arc<dyn RelyingPartyStore>,
    /// The identity provider's session layer.
    pub sessions: Arc<dyn SessionProvider>,
    /// Signing key material.
    pub keys: Arc<dyn SigningCredentialStore>,
}

impl WsFedState {
    /// Creates a new state.
    pub fn new(
        config: WsFedConfig,
        relying_parties: Arc<dyn RelyingPartyStore>,
        sessions: Arc<dyn SessionProvider>,
        keys: Arc<dyn SigningCredentialStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            relying_parties,
            sessions,
            keys,
        }
    }

    /// Takes a snapshot of the signing keys.
    ///
    /// # Errors
    ///
    /// Returns [`WsFedError::SigningCredentialUnavailable`] if none is
    /// configured.
    pub async fn key_snapshot(&self) -> Result<Arc<KeySet>, WsFedError> {
        self.keys
            .current_key_set()
            .await?
            .ok_or(WsFedError::SigningCredentialUnavailable)
    }
}

impl std::fmt::Debug for WsFedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsFedState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Lookup of relying parties by realm.
#[async_trait::async_trait]
pub trait RelyingPartyStore: Send + Sync + 'static {
    /// Returns the relying party registered under exactly `realm`.
    async fn find_by_realm(&self, realm: &str) -> Result<Option<RelyingParty>, ProviderError>;
}

/// The identity provider's session layer.
///
/// The bridge only reads sessions. Authentication itself happens on the
/// login page.
#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync + 'static {
    /// Returns the session carried by the request, if any.
    async fn current_session(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<AuthenticatedSession>, ProviderError>;

    /// Marks the caller's session so the next login re-authenticates even
    /// if the session would otherwise be reused.
    async fn require_fresh_authentication(&self, headers: &HeaderMap) -> Result<(), ProviderError>;

    /// Ends the caller's session. Returns a `Set-Cookie` value to clear
    /// session state on the user agent, if the provider uses cookies.
    async fn sign_out(&self, headers: &HeaderMap) -> Result<Option<HeaderValue>, ProviderError>;
}

/// Source of the current signing key set.
#[async_trait::async_trait]
pub trait SigningCredentialStore: Send + Sync + 'static {
    /// Returns the current key set; `None` if no credential is configured.
    async fn current_key_set(&self) -> Result<Option<Arc<KeySet>>, ProviderError>;
}

#[async_trait::async_trait]
impl SigningCredentialStore for KeyRing {
    async fn current_key_set(&self) -> Result<Option<Arc<KeySet>>, ProviderError> {
        Ok(self.snapshot())
    }
}

/// Error type for collaborator operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The backing service is unreachable.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ProviderError> for WsFedError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_base_url() {
        let config = WsFedConfig::from_base_url("urn:idp", "https://idp.example.com/");
        assert_eq!(config.endpoint_url, "https://idp.example.com/wsfederation");
        assert_eq!(config.login_path, "/account/login");
        assert_eq!(config.post_logout_redirect, "/");
    }

    #[tokio::test]
    async fn empty_ring_reports_unavailable() {
        let ring = KeyRing::empty();
        assert!(ring.current_key_set().await.unwrap().is_none());
    }

    #[test]
    fn provider_errors_map_to_provider_kind() {
        let err: WsFedError = ProviderError::Storage("down".to_string()).into();
        assert_eq!(err.kind(), "ProviderError");
        assert_eq!(err.http_status(), 500);
    }
}
