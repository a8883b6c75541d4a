//! Server configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Public base URL (used for the endpoint address in metadata).
    pub base_url: String,

    /// Issuer name placed in tokens and metadata.
    pub issuer: String,

    /// Path of the login page.
    pub login_path: String,

    /// Where sign-out lands when no reply URL is validated.
    pub post_logout_redirect: String,

    /// PEM private key of the active signing credential.
    pub signing_key_path: Option<PathBuf>,

    /// PEM certificate of the active signing credential.
    pub signing_cert_path: Option<PathBuf>,

    /// Extra PEM certificates published in metadata during a key rollover.
    pub additional_cert_paths: Vec<PathBuf>,

    /// JSON file of relying party registrations.
    pub relying_parties_path: Option<PathBuf>,

    /// JSON file of development users.
    pub users_path: Option<PathBuf>,

    /// Name of the session cookie.
    pub session_cookie: String,

    /// Session lifetime in seconds.
    pub session_lifetime: i64,

    /// CORS allowed origins (comma-separated).
    pub cors_origins: Vec<String>,

    /// Log level.
    pub log_level: String,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let host = std::env::var("WSF_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("WSF_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let base_url = std::env::var("WSF_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"));

        let issuer = std::env::var("WSF_ISSUER").unwrap_or_else(|_| base_url.clone());

        let login_path =
            std::env::var("WSF_LOGIN_PATH").unwrap_or_else(|_| "/account/login".to_string());
        if !login_path.starts_with('/') {
            anyhow::bail!("WSF_LOGIN_PATH must be an absolute path, got {login_path}");
        }

        let post_logout_redirect =
            std::env::var("WSF_POST_LOGOUT_REDIRECT").unwrap_or_else(|_| "/".to_string());

        let signing_key_path = std::env::var("WSF_SIGNING_KEY_PATH").ok().map(PathBuf::from);
        let signing_cert_path = std::env::var("WSF_SIGNING_CERT_PATH").ok().map(PathBuf::from);
        if signing_key_path.is_some() != signing_cert_path.is_some() {
            anyhow::bail!("WSF_SIGNING_KEY_PATH and WSF_SIGNING_CERT_PATH must be set together");
        }

        let additional_cert_paths = std::env::var("WSF_ADDITIONAL_CERT_PATHS")
            .map(|s| split_list(&s).map(PathBuf::from).collect())
            .unwrap_or_default();

        let relying_parties_path = std::env::var("WSF_RELYING_PARTIES_PATH").ok().map(PathBuf::from);
        let users_path = std::env::var("WSF_USERS_PATH").ok().map(PathBuf::from);

        let session_cookie =
            std::env::var("WSF_SESSION_COOKIE").unwrap_or_else(|_| "wsf_session".to_string());

        let session_lifetime = std::env::var("WSF_SESSION_LIFETIME")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs: &i64| *secs > 0)
            .unwrap_or(36000); // 10 hours

        let cors_origins = std::env::var("WSF_CORS_ORIGINS")
            .map(|s| split_list(&s).map(String::from).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            host,
            port,
            base_url,
            issuer,
            login_path,
            post_logout_redirect,
            signing_key_path,
            signing_cert_path,
            additional_cert_paths,
            relying_parties_path,
            users_path,
            session_cookie,
            session_lifetime,
            cors_origins,
            log_level,
        })
    }

    /// Creates a configuration for testing.
    ///
    /// Binds an ephemeral port and loads the repository's fixture key,
    /// relying parties and users.
    #[must_use]
    pub fn for_testing() -> Self {
        let fixtures = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures"));
        Self {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
            base_url: "http://localhost:8080".to_string(),
            issuer: "urn:wsfed-bridge:test".to_string(),
            login_path: "/account/login".to_string(),
            post_logout_redirect: "/".to_string(),
            signing_key_path: Some(fixtures.join("signing.key")),
            signing_cert_path: Some(fixtures.join("signing.crt")),
            additional_cert_paths: Vec::new(),
            relying_parties_path: Some(fixtures.join("relying_parties.json")),
            users_path: Some(fixtures.join("users.json")),
            session_cookie: "wsf_session".to_string(),
            session_lifetime: 3600,
            cors_origins: vec!["*".to_string()],
            log_level: "debug".to_string(),
        }
    }

    /// Settings handed to the WS-Federation endpoints.
    #[must_use]
    pub fn wsfed_config(&self) -> wsf_protocol::endpoints::WsFedConfig {
        wsf_protocol::endpoints::WsFedConfig::from_base_url(self.issuer.clone(), &self.base_url)
            .with_login_path(self.login_path.clone())
            .with_post_logout_redirect(self.post_logout_redirect.clone())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            issuer: "http://localhost:8080".to_string(),
            login_path: "/account/login".to_string(),
            post_logout_redirect: "/".to_string(),
            signing_key_path: None,
            signing_cert_path: None,
            additional_cert_paths: Vec::new(),
            relying_parties_path: None,
            users_path: None,
            session_cookie: "wsf_session".to_string(),
            session_lifetime: 36000,
            cors_origins: vec!["*".to_string()],
            log_level: "info".to_string(),
        }
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}
