//! OpenID Connect relying party: authorization code flow with PKCE.
//!
//! This crate runs the browser login flow against an external identity
//! provider:
//! - [`AuthFlow::start_authorization`] mints a state and PKCE pair, records
//!   the pending login and returns the provider authorization URL
//! - [`AuthFlow::complete_authorization`] consumes the pending login exactly
//!   once, exchanges the code, resolves the user and stores the session
//! - [`AuthFlow::get_session`] reads a completed session back by state
//!
//! Endpoints come from the provider's discovery document when it can be
//! loaded, otherwise from `{provider}/oidc/{authorize,token,userinfo}`.
//!
//! # Example
//!
//! ```rust,ignore
//! use tessera_oidc::{AuthFlow, OidcConfig, StoreConfig};
//!
//! let config = OidcConfig::new("https://idp.example.com").with_client_id("web");
//! let flow = AuthFlow::connect(config, StoreConfig::default()).await?;
//!
//! let start = flow.start_authorization().await;
//! // redirect the browser to start.auth_url, then on callback:
//! let session = flow.complete_authorization(&code, &start.state).await?;
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod flow;
pub mod pkce;
pub mod provider;
pub mod store;

pub use config::OidcConfig;
pub use discovery::DiscoveryDocument;
pub use error::{OidcError, Result};
pub use flow::{AuthFlow, AuthorizationStart, DEFAULT_EXPIRES_IN};
pub use pkce::{PkceChallenge, derive_challenge, generate_state, generate_verifier};
pub use provider::{
    HttpProvider, IdentityProvider, ProviderEndpoints, TokenRequest, TokenResponse, UserInfo,
};
pub use store::{CompletedSession, FlowStore, PendingLogin, StoreConfig, StoreStats};
