//! Identity provider HTTP client: endpoint resolution, token exchange, userinfo.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::config::OidcConfig;
use crate::discovery::DiscoveryDocument;
use crate::error::{OidcError, Result};

/// Cap on how much of a provider error body is carried into error messages.
const MAX_ERROR_DETAIL: usize = 200;

// ============================================================================
// Endpoints
// ============================================================================

/// The three provider endpoints a flow talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub authorization: String,
    pub token: String,
    pub userinfo: String,
    /// Whether at least one endpoint came from the discovery document.
    pub discovered: bool,
}

impl ProviderEndpoints {
    /// Prefer discovery values; fall back to `{provider}/oidc/{authorize|token|userinfo}`
    /// per field when the value is missing or empty.
    pub fn resolve(config: &OidcConfig, discovery: &DiscoveryDocument) -> Self {
        let pick = |found: &Option<String>, suffix: &str| {
            found
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}/oidc/{}", config.provider_url, suffix))
        };

        Self {
            authorization: pick(&discovery.authorization_endpoint, "authorize"),
            token: pick(&discovery.token_endpoint, "token"),
            userinfo: pick(&discovery.userinfo_endpoint, "userinfo"),
            discovered: !discovery.is_empty(),
        }
    }

    /// Static endpoints only, as used when discovery is unavailable.
    pub fn fallback(config: &OidcConfig) -> Self {
        Self::resolve(config, &DiscoveryDocument::default())
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Form body of an `authorization_code` grant.
#[derive(Clone, Serialize)]
pub struct TokenRequest {
    pub grant_type: &'static str,
    pub code: String,
    pub redirect_uri: String,
    pub client_id: String,
    pub code_verifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl TokenRequest {
    /// Build the exchange request for `code`, proving possession of `code_verifier`.
    pub fn authorization_code(
        config: &OidcConfig,
        code: impl Into<String>,
        code_verifier: impl Into<String>,
    ) -> Self {
        Self {
            grant_type: "authorization_code",
            code: code.into(),
            redirect_uri: config.redirect_uri.clone(),
            client_id: config.client_id.clone(),
            code_verifier: code_verifier.into(),
            client_secret: config.client_secret.clone(),
        }
    }
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("grant_type", &self.grant_type)
            .field("redirect_uri", &self.redirect_uri)
            .field("client_id", &self.client_id)
            .field("confidential", &self.client_secret.is_some())
            .finish_non_exhaustive()
    }
}

/// Token endpoint response. Missing fields are tolerated and defaulted by the flow.
#[derive(Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub access_token: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub id_token: String,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("has_access_token", &!self.access_token.is_empty())
            .field("has_id_token", &!self.id_token.is_empty())
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Resolved user identity.
///
/// A missing or null `sub` is kept as an empty string rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Read an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `expires_in` as a JSON number or a numeric string; anything else reads as absent.
fn lenient_seconds<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Whole(u64),
        Fractional(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Seconds>::deserialize(deserializer)? {
        Some(Seconds::Whole(secs)) => Some(secs),
        Some(Seconds::Fractional(secs)) if secs.is_finite() && secs >= 0.0 => Some(secs as u64),
        Some(Seconds::Text(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

// ============================================================================
// IdentityProvider Trait
// ============================================================================

/// Outbound calls to the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, request: &TokenRequest) -> Result<TokenResponse>;

    /// Resolve the identity behind an access token.
    ///
    /// Implementations must fail with [`OidcError::MissingAccessToken`] on an
    /// empty token without making a request.
    async fn fetch_userinfo(&self, access_token: &str) -> Result<UserInfo>;
}

// ============================================================================
// HttpProvider
// ============================================================================

/// [`IdentityProvider`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    endpoints: ProviderEndpoints,
}

impl HttpProvider {
    /// Create a provider with its own client bounded by `config.http_timeout`.
    pub fn from_config(config: &OidcConfig, endpoints: ProviderEndpoints) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| OidcError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, endpoints))
    }

    /// Create a provider around an existing client.
    pub fn with_client(client: reqwest::Client, endpoints: ProviderEndpoints) -> Self {
        Self { client, endpoints }
    }

    /// Get the endpoints this provider calls.
    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }
}

#[async_trait]
impl IdentityProvider for HttpProvider {
    async fn exchange_code(&self, request: &TokenRequest) -> Result<TokenResponse> {
        debug!(endpoint = %self.endpoints.token, "Exchanging authorization code");

        let response = self
            .client
            .post(&self.endpoints.token)
            .form(request)
            .send()
            .await
            .map_err(|e| OidcError::TokenExchangeFailed {
                status: None,
                message: format!("Token exchange request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response).await;
            warn!(status = status.as_u16(), detail = %detail, "Token endpoint rejected exchange");
            return Err(OidcError::TokenExchangeFailed {
                status: Some(status.as_u16()),
                message: format!("token endpoint returned {}: {}", status.as_u16(), detail),
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OidcError::TokenExchangeFailed {
                status: None,
                message: format!("Failed to parse token response: {}", e),
            })
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<UserInfo> {
        if access_token.is_empty() {
            return Err(OidcError::MissingAccessToken);
        }

        let response = self
            .client
            .get(&self.endpoints.userinfo)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OidcError::UserinfoFetchFailed {
                status: None,
                message: format!("Userinfo request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response).await;
            warn!(status = status.as_u16(), detail = %detail, "Userinfo endpoint rejected token");
            return Err(OidcError::UserinfoFetchFailed {
                status: Some(status.as_u16()),
                message: format!("userinfo endpoint returned {}: {}", status.as_u16(), detail),
            });
        }

        let info = response
            .json::<UserInfo>()
            .await
            .map_err(|e| OidcError::UserinfoFetchFailed {
                status: None,
                message: format!("Failed to parse userinfo response: {}", e),
            })?;

        if info.sub.is_empty() {
            warn!("Userinfo response has no subject identifier");
        }

        Ok(info)
    }
}

/// Summarize a provider error body: the OAuth `error` code when present,
/// otherwise the leading text.
async fn error_detail(response: reqwest::Response) -> String {
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    if let Ok(body) = serde_json::from_str::<serde_json::Value>(&text) {
        if let Some(code) = body.get("error").and_then(|v| v.as_str()) {
            return match body.get("error_description").and_then(|v| v.as_str()) {
                Some(desc) => format!("{code} ({desc})"),
                None => code.to_string(),
            };
        }
    }

    if text.is_empty() {
        return "empty response".to_string();
    }
    text.chars().take(MAX_ERROR_DETAIL).collect()
}
