//! Common test utilities and fixtures.

use std::time::Duration;

use reqwest::{redirect, Client, Response};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::sleep;

use wsf_server::{Server, ServerConfig};

/// Sign-in query sent by an OWIN relying party registered as `urn:owinrp`.
pub const OWIN_QUERY: &str =
    "wtrealm=urn%3Aowinrp&wreply=http%3A%2F%2Flocalhost%3A10313%2F&wa=wsignin1.0";

/// Where the bridge sends an anonymous browser for [`OWIN_QUERY`].
pub const OWIN_LOCATION: &str = "/account/login?returnUrl=%2Fwsfederation%3Fwtrealm%3Durn%253Aowinrp%26wreply%3Dhttp%253A%252F%252Flocalhost%253A10313%252F%26wa%3Dwsignin1.0";

/// Subject identifier of the `alice` fixture user.
pub const ALICE_SUBJECT: &str = "8f14e45f-ceea-467f-a0e6-1c3b5a3c2d11";

/// Test environment that manages the server.
pub struct TestEnv {
    /// Base URL of the running server.
    pub base_url: String,
    /// HTTP client for testing. Keeps cookies and never follows redirects.
    pub client: Client,
    /// Server shutdown signal.
    _shutdown_tx: oneshot::Sender<()>,
}

impl TestEnv {
    /// Starts a server on an ephemeral port.
    pub async fn new() -> anyhow::Result<Self> {
        // Initialize tracing for tests
        let _ = tracing_subscriber::fmt()
            .with_env_filter("wsf_server=debug,wsf_protocol=debug")
            .with_test_writer()
            .try_init();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        let mut config = ServerConfig::for_testing();
        config.base_url = base_url.clone();

        // Create shutdown channel
        let (_shutdown_tx, shutdown_rx) = oneshot::channel();

        // Start server
        let server = Server::new(config).await?;
        tokio::spawn(async move {
            tokio::select! {
                result = server.serve(listener) => {
                    if let Err(e) = result {
                        tracing::error!("Server error: {}", e);
                    }
                }
                _ = shutdown_rx => {
                    tracing::info!("Server shutdown requested");
                }
            }
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(redirect::Policy::none())
            .cookie_store(true)
            .build()?;

        wait_for_server(&client, &base_url).await?;

        Ok(Self {
            base_url,
            client,
            _shutdown_tx,
        })
    }

    /// Returns an absolute URL for a server path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a GET for a server path.
    pub async fn get(&self, path: &str) -> anyhow::Result<Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    /// Submits the login form.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        return_url: &str,
    ) -> anyhow::Result<Response> {
        Ok(self
            .client
            .post(self.url("/account/login"))
            .form(&[
                ("username", username),
                ("password", password),
                ("returnUrl", return_url),
            ])
            .send()
            .await?)
    }
}

/// Returns the `Location` header of a response.
pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Waits for the server to be ready.
async fn wait_for_server(client: &Client, base_url: &str) -> anyhow::Result<()> {
    let health_url = format!("{}/health", base_url);
    let max_attempts = 50;

    for attempt in 1..=max_attempts {
        match client.get(&health_url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Server ready after {} attempts", attempt);
                return Ok(());
            }
            _ => sleep(Duration::from_millis(100)).await,
        }
    }

    anyhow::bail!("Server did not become ready at {}", base_url)
}
