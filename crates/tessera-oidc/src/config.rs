//! Relying-party configuration.

use std::fmt;
use std::time::Duration;

/// Default provider base URL.
pub const DEFAULT_PROVIDER_URL: &str = "http://localhost:8000";

/// Default client identifier.
pub const DEFAULT_CLIENT_ID: &str = "tessera-client";

/// Default redirect URI registered with the provider.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/callback";

/// Default requested scope.
pub const DEFAULT_SCOPE: &str = "openid profile email";

/// Default timeout for every outbound provider request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Relying-party configuration shared by every flow.
#[derive(Clone)]
pub struct OidcConfig {
    /// Provider base URL (no trailing slash).
    pub provider_url: String,
    pub client_id: String,
    /// Client secret. `None` means public client: no `client_secret` is sent.
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    /// Space-delimited scope string sent on authorize.
    pub scope: String,
    /// Timeout applied to discovery, token and userinfo requests.
    pub http_timeout: Duration,
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            client_secret: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl OidcConfig {
    /// Create a config for the given provider, with defaults for everything else.
    pub fn new(provider_url: impl Into<String>) -> Self {
        Self::default().with_provider_url(provider_url)
    }

    /// Set the provider base URL. Trailing slashes are trimmed.
    pub fn with_provider_url(mut self, url: impl Into<String>) -> Self {
        self.provider_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the client identifier.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Set the client secret. An empty secret keeps the client public.
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.client_secret = (!secret.is_empty()).then_some(secret);
        self
    }

    /// Set the redirect URI.
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    /// Set the requested scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Set the provider request timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Whether a client secret is sent on token exchange.
    pub fn is_confidential(&self) -> bool {
        self.client_secret.is_some()
    }

    /// URL of the provider's discovery document.
    pub fn discovery_url(&self) -> String {
        format!("{}/.well-known/openid-configuration", self.provider_url)
    }
}

impl fmt::Debug for OidcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OidcConfig")
            .field("provider_url", &self.provider_url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "***REDACTED***"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}
