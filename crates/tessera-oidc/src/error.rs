//! Error types for the authorization flow.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OidcError>;

/// Errors that can occur while running the authorization code flow.
///
/// Upstream variants carry the provider's HTTP status when one was received.
/// A `status` of `None` means the request never produced a usable response
/// (timeout, refused connection, unparseable body).
#[derive(Debug, thiserror::Error)]
pub enum OidcError {
    /// The callback state was never issued, was already consumed, or has expired.
    #[error("Unknown or expired state")]
    UnknownOrExpiredState,

    /// No completed session exists for the state.
    #[error("Session not found")]
    SessionNotFound,

    /// The provider rejected the code/verifier pair or could not be reached.
    #[error("Token exchange failed: {message}")]
    TokenExchangeFailed {
        status: Option<u16>,
        message: String,
    },

    /// No access token was available to call the userinfo endpoint.
    #[error("Missing access token")]
    MissingAccessToken,

    /// The userinfo endpoint rejected the token or could not be reached.
    #[error("Userinfo fetch failed: {message}")]
    UserinfoFetchFailed {
        status: Option<u16>,
        message: String,
    },

    /// The discovery document could not be loaded. Non-fatal: callers fall
    /// back to static endpoints.
    #[error("Discovery unavailable: {0}")]
    DiscoveryUnavailable(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),
}

impl OidcError {
    /// Provider status code attached to an upstream failure, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            OidcError::TokenExchangeFailed { status, .. }
            | OidcError::UserinfoFetchFailed { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<tessera_session::Error> for OidcError {
    fn from(e: tessera_session::Error) -> Self {
        OidcError::Config(e.to_string())
    }
}
