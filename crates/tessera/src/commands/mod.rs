//! CLI command handlers.

pub mod endpoints;
pub mod serve;

use std::time::Duration;

use clap::Args;
use tessera_oidc::OidcConfig;
use tessera_oidc::config::{
    DEFAULT_CLIENT_ID, DEFAULT_PROVIDER_URL, DEFAULT_REDIRECT_URI, DEFAULT_SCOPE,
};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Relying-party configuration.
    pub oidc: OidcConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Identity provider and client registration settings.
#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// Identity provider base URL
    #[arg(long = "provider", global = true, env = "OIDC_PROVIDER_URL", default_value = DEFAULT_PROVIDER_URL)]
    pub provider_url: String,

    /// Client identifier registered with the provider
    #[arg(long, global = true, env = "OIDC_CLIENT_ID", default_value = DEFAULT_CLIENT_ID)]
    pub client_id: String,

    /// Client secret (leave empty for a public client)
    #[arg(long, global = true, env = "OIDC_CLIENT_SECRET", default_value = "", hide_env_values = true)]
    pub client_secret: String,

    /// Redirect URI registered with the provider
    #[arg(long, global = true, env = "OIDC_REDIRECT_URI", default_value = DEFAULT_REDIRECT_URI)]
    pub redirect_uri: String,

    /// Space-delimited scopes to request
    #[arg(long, global = true, env = "OIDC_SCOPE", default_value = DEFAULT_SCOPE)]
    pub scope: String,

    /// Timeout for every provider request, in seconds
    #[arg(long, global = true, env = "TESSERA_HTTP_TIMEOUT_SECS", default_value_t = 10)]
    pub http_timeout_secs: u64,
}

impl ProviderArgs {
    /// Build the relying-party configuration.
    pub fn to_config(&self) -> OidcConfig {
        OidcConfig::new(&self.provider_url)
            .with_client_id(&self.client_id)
            .with_client_secret(&self.client_secret)
            .with_redirect_uri(&self.redirect_uri)
            .with_scope(&self.scope)
            .with_http_timeout(Duration::from_secs(self.http_timeout_secs))
    }
}
