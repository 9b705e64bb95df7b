//! OpenID Connect Discovery 1.0 document loading.
//!
//! The document is fetched once at startup from
//! `{provider}/.well-known/openid-configuration`. Failure is never fatal:
//! [`load_or_default`] logs the problem and returns an empty document, and
//! endpoint resolution falls back to static provider paths.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::OidcConfig;
use crate::error::{OidcError, Result};

/// The subset of provider metadata this client consumes.
///
/// Every field is optional; a missing or empty value falls back to the
/// static endpoint for that role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
}

impl DiscoveryDocument {
    /// True when no endpoint was learned from the provider.
    pub fn is_empty(&self) -> bool {
        [
            &self.authorization_endpoint,
            &self.token_endpoint,
            &self.userinfo_endpoint,
        ]
        .iter()
        .all(|v| v.as_deref().is_none_or(str::is_empty))
    }
}

/// Fetch the provider's discovery document.
///
/// Transport errors, non-success statuses and malformed bodies all map to
/// [`OidcError::DiscoveryUnavailable`]. The request is bounded by
/// `config.http_timeout`.
pub async fn load(client: &reqwest::Client, config: &OidcConfig) -> Result<DiscoveryDocument> {
    let url = config.discovery_url();

    let response = client
        .get(&url)
        .timeout(config.http_timeout)
        .send()
        .await
        .map_err(|e| OidcError::DiscoveryUnavailable(format!("request to {url} failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(OidcError::DiscoveryUnavailable(format!(
            "{url} returned {status}"
        )));
    }

    response
        .json::<DiscoveryDocument>()
        .await
        .map_err(|e| OidcError::DiscoveryUnavailable(format!("invalid document at {url}: {e}")))
}

/// Fetch the discovery document, degrading to an empty one on any failure.
pub async fn load_or_default(client: &reqwest::Client, config: &OidcConfig) -> DiscoveryDocument {
    match load(client, config).await {
        Ok(doc) => {
            info!(
                provider = %config.provider_url,
                issuer = doc.issuer.as_deref().unwrap_or(""),
                "Discovery document loaded"
            );
            doc
        }
        Err(e) => {
            warn!(
                provider = %config.provider_url,
                error = %e,
                "Discovery unavailable, using fallback endpoints"
            );
            DiscoveryDocument::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> OidcConfig {
        OidcConfig::new(server.uri()).with_http_timeout(Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_load_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issuer": "https://idp.example.com",
                "authorization_endpoint": "https://idp.example.com/authorize",
                "token_endpoint": "https://idp.example.com/token",
                "userinfo_endpoint": "https://idp.example.com/userinfo",
                "jwks_uri": "https://idp.example.com/jwks.json"
            })))
            .mount(&server)
            .await;

        let doc = load(&reqwest::Client::new(), &config_for(&server))
            .await
            .unwrap();

        assert_eq!(doc.issuer.as_deref(), Some("https://idp.example.com"));
        assert_eq!(
            doc.token_endpoint.as_deref(),
            Some("https://idp.example.com/token")
        );
        assert!(!doc.is_empty());
    }

    #[tokio::test]
    async fn test_load_partial_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_endpoint": "https://idp.example.com/token"
            })))
            .mount(&server)
            .await;

        let doc = load(&reqwest::Client::new(), &config_for(&server))
            .await
            .unwrap();

        assert!(doc.authorization_endpoint.is_none());
        assert!(doc.token_endpoint.is_some());
    }

    #[tokio::test]
    async fn test_non_success_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = load(&reqwest::Client::new(), &config_for(&server)).await;
        assert!(matches!(result, Err(OidcError::DiscoveryUnavailable(_))));
    }

    #[tokio::test]
    async fn test_malformed_body_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = load(&reqwest::Client::new(), &config_for(&server)).await;
        assert!(matches!(result, Err(OidcError::DiscoveryUnavailable(_))));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = OidcConfig::new(server.uri()).with_http_timeout(Duration::from_millis(50));
        let result = load(&reqwest::Client::new(), &config).await;
        assert!(matches!(result, Err(OidcError::DiscoveryUnavailable(_))));
    }

    #[tokio::test]
    async fn test_load_or_default_degrades() {
        // Nothing listens on this port
        let config = OidcConfig::new("http://127.0.0.1:9").with_http_timeout(Duration::from_secs(1));
        let doc = load_or_default(&reqwest::Client::new(), &config).await;
        assert!(doc.is_empty());
    }

    #[test]
    fn test_empty_strings_count_as_missing() {
        let doc = DiscoveryDocument {
            authorization_endpoint: Some(String::new()),
            ..Default::default()
        };
        assert!(doc.is_empty());
    }
}
