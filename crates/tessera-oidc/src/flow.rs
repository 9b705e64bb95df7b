//! Authorization code flow: initiation and callback completion.
//!
//! [`AuthFlow`] ties together configuration, resolved endpoints, the flow
//! store and an [`IdentityProvider`]. It is cheap to share behind an `Arc`
//! and safe to drive from many tasks at once.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::OidcConfig;
use crate::discovery;
use crate::error::{OidcError, Result};
use crate::pkce::{CHALLENGE_METHOD, PkceChallenge, generate_state};
use crate::provider::{
    HttpProvider, IdentityProvider, ProviderEndpoints, TokenRequest, UserInfo,
};
use crate::store::{CompletedSession, FlowStore, PendingLogin, StoreConfig};

/// Lifetime reported when the provider omits `expires_in` or sends zero.
pub const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Result of starting a login: where to send the browser and the state to expect back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationStart {
    pub auth_url: String,
    pub state: String,
}

/// Relying-party flow engine.
#[derive(Debug)]
pub struct AuthFlow {
    config: OidcConfig,
    endpoints: ProviderEndpoints,
    store: FlowStore,
    provider: Arc<dyn IdentityProvider>,
}

impl AuthFlow {
    /// Assemble a flow from already-resolved parts.
    pub fn new(
        config: OidcConfig,
        endpoints: ProviderEndpoints,
        store: FlowStore,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            config,
            endpoints,
            store,
            provider,
        }
    }

    /// Load discovery (falling back to static endpoints) and build an
    /// HTTP-backed flow.
    pub async fn connect(config: OidcConfig, store_config: StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| OidcError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let document = discovery::load_or_default(&client, &config).await;
        let endpoints = ProviderEndpoints::resolve(&config, &document);
        info!(
            authorization = %endpoints.authorization,
            token = %endpoints.token,
            userinfo = %endpoints.userinfo,
            discovered = endpoints.discovered,
            "Provider endpoints resolved"
        );

        let provider = HttpProvider::with_client(client, endpoints.clone());
        let store = FlowStore::new(store_config)?;

        Ok(Self::new(config, endpoints, store, Arc::new(provider)))
    }

    pub fn config(&self) -> &OidcConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    pub fn store(&self) -> &FlowStore {
        &self.store
    }

    /// Begin a login: mint state and PKCE, remember the verifier, and build
    /// the provider authorization URL.
    pub async fn start_authorization(&self) -> AuthorizationStart {
        let state = generate_state();
        let pkce = PkceChallenge::generate();

        let auth_url = self.build_authorization_url(&state, &pkce.challenge);
        self.store
            .put_pending(PendingLogin::new(state.clone(), pkce.verifier))
            .await;

        info!(client_id = %self.config.client_id, "Authorization started");
        AuthorizationStart { auth_url, state }
    }

    /// Build the authorization URL for a given state and challenge.
    ///
    /// Parameters are emitted in a fixed order. An endpoint that already
    /// carries a query string is extended with `&`.
    pub fn build_authorization_url(&self, state: &str, code_challenge: &str) -> String {
        let params = [
            ("response_type", "code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("scope", self.config.scope.as_str()),
            ("state", state),
            ("code_challenge", code_challenge),
            ("code_challenge_method", CHALLENGE_METHOD),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if self.endpoints.authorization.contains('?') {
            '&'
        } else {
            '?'
        };
        format!("{}{}{}", self.endpoints.authorization, separator, query)
    }

    /// Finish a login from the provider callback.
    ///
    /// The pending entry is consumed before any network call, so a state can
    /// be completed at most once and a failed attempt cannot be retried.
    pub async fn complete_authorization(
        &self,
        code: &str,
        state: &str,
    ) -> Result<CompletedSession> {
        let Some(pending) = self.store.pop_pending(state).await else {
            warn!("Callback with unknown, consumed or expired state");
            return Err(OidcError::UnknownOrExpiredState);
        };

        let request = TokenRequest::authorization_code(&self.config, code, pending.code_verifier);
        let tokens = self.provider.exchange_code(&request).await.inspect_err(|e| {
            warn!(error = %e, "Token exchange failed");
        })?;
        debug!(response = ?tokens, "Token response received");

        if tokens.access_token.is_empty() {
            warn!("Token response carried no access token");
            return Err(OidcError::MissingAccessToken);
        }

        let expires_in = tokens
            .expires_in
            .filter(|&secs| secs > 0)
            .unwrap_or(DEFAULT_EXPIRES_IN);
        let scope = tokens
            .scope
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.config.scope.clone());

        let user = self.fetch_userinfo(&tokens.access_token).await?;

        let session = CompletedSession {
            access_token: tokens.access_token,
            id_token: tokens.id_token,
            expires_in,
            scope,
            user,
        };
        self.store.put_completed(state, session.clone()).await;

        info!(sub = %session.user.sub, expires_in, "Login completed");
        Ok(session)
    }

    /// Resolve the identity behind an access token.
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<UserInfo> {
        self.provider
            .fetch_userinfo(access_token)
            .await
            .inspect_err(|e| warn!(error = %e, "Userinfo lookup failed"))
    }

    /// Read the completed session for `state`. Pending logins are not sessions.
    pub async fn get_session(&self, state: &str) -> Result<CompletedSession> {
        self.store
            .get_completed(state)
            .await
            .ok_or(OidcError::SessionNotFound)
    }
}
