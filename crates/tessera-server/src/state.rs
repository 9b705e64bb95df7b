//! Application state shared across handlers.

use std::sync::Arc;

use tessera_oidc::AuthFlow;

use crate::config::ServerConfig;
use crate::ratelimit::{SharedRateLimiter, create_rate_limiter};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The authorization flow engine.
    pub flow: Arc<AuthFlow>,

    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Limiter for the `/auth` routes (None when rate limiting is disabled).
    pub auth_limiter: Option<SharedRateLimiter>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(flow: AuthFlow, config: ServerConfig) -> Self {
        Self::from_shared(Arc::new(flow), config)
    }

    /// Create application state around a flow that is shared elsewhere
    /// (for example with a background sweeper).
    pub fn from_shared(flow: Arc<AuthFlow>, config: ServerConfig) -> Self {
        let auth_limiter = (config.rate_limiting && config.auth_rpm > 0)
            .then(|| create_rate_limiter(config.auth_rpm));

        Self {
            flow,
            config: Arc::new(config),
            auth_limiter,
        }
    }
}
