//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8001;

/// Default requests per minute on the `/auth` routes.
pub const DEFAULT_AUTH_RPM: u32 = 120;

/// Default max body size for JSON requests (64 KiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Frontend origins allowed by default.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Origins allowed to call the API from a browser (empty = no CORS layer).
    pub cors_origins: Vec<String>,

    /// Enable rate limiting on the `/auth` routes.
    pub rate_limiting: bool,

    /// Rate limit: requests per minute for the `/auth` routes.
    pub auth_rpm: u32,

    /// Enable request logging.
    pub request_logging: bool,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            rate_limiting: true,
            auth_rpm: DEFAULT_AUTH_RPM,
            request_logging: true,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set CORS allowed origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Enable or disable rate limiting.
    pub fn with_rate_limiting(mut self, enabled: bool) -> Self {
        self.rate_limiting = enabled;
        self
    }

    /// Set the `/auth` rate limit. Zero disables rate limiting.
    pub fn with_auth_rpm(mut self, rpm: u32) -> Self {
        self.auth_rpm = rpm;
        if rpm == 0 {
            self.rate_limiting = false;
        }
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set the maximum request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }
}
