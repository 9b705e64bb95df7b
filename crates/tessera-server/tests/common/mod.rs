//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tessera_oidc::{AuthFlow, OidcConfig, StoreConfig};
use tessera_server::{Server, ServerConfig};

/// A mock identity provider backed by wiremock.
pub struct MockProvider {
    pub server: MockServer,
}

impl MockProvider {
    /// Start a provider that publishes a discovery document.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base = server.uri();
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issuer": base,
                "authorization_endpoint": format!("{base}/oidc/authorize"),
                "token_endpoint": format!("{base}/oidc/token"),
                "userinfo_endpoint": format!("{base}/oidc/userinfo")
            })))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Accept any code and issue `access_token`.
    pub async fn issue_tokens(&self, access_token: &str) {
        Mock::given(method("POST"))
            .and(path("/oidc/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": access_token,
                "id_token": "idt1",
                "token_type": "Bearer",
                "expires_in": 900,
                "scope": "openid profile email"
            })))
            .mount(&self.server)
            .await;
    }

    /// Resolve `access_token` to user `sub`.
    pub async fn resolve_user(&self, access_token: &str, sub: &str) {
        Mock::given(method("GET"))
            .and(path("/oidc/userinfo"))
            .and(header(
                "authorization",
                format!("Bearer {access_token}").as_str(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": sub,
                "email": format!("{sub}@example.com"),
                "name": "Test User"
            })))
            .mount(&self.server)
            .await;
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }
}

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server against `provider_url` with rate limiting off.
    pub async fn start(provider_url: &str) -> Result<Self> {
        Self::start_with(provider_url, ServerConfig::new().with_rate_limiting(false)).await
    }

    /// Start a server with a custom server config; the bind address is replaced.
    pub async fn start_with(provider_url: &str, config: ServerConfig) -> Result<Self> {
        let addr = find_available_port().await?;

        let oidc = OidcConfig::new(provider_url)
            .with_client_id("test-client")
            .with_http_timeout(Duration::from_secs(2));
        let flow = AuthFlow::connect(oidc, StoreConfig::default()).await?;

        let config = config.with_bind_address(addr).with_request_logging(false);
        let server = Server::new(flow, config);
        let handle = tokio::spawn(async move {
            let _ = server.run().await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(format!("{}{}", self.base_url(), path))
    }

    /// POST /auth/start and return `(auth_url, state)`.
    pub async fn start_login(&self) -> Result<(String, String)> {
        let body: serde_json::Value = self
            .post("/auth/start")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let auth_url = body["auth_url"].as_str().unwrap_or_default().to_string();
        let state = body["state"].as_str().unwrap_or_default().to_string();
        Ok((auth_url, state))
    }

    /// POST /auth/callback with the given code and state.
    pub async fn callback(&self, code: &str, state: &str) -> Result<reqwest::Response> {
        Ok(self
            .post("/auth/callback")
            .json(&serde_json::json!({ "code": code, "state": state }))
            .send()
            .await?)
    }
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
