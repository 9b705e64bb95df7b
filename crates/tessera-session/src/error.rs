//! Error types for cache construction.

/// Error type for cache operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The cache configuration cannot produce a usable cache.
    #[error("Invalid cache config: {0}")]
    InvalidConfig(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;
