//! Configuration for the expiring cache.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default maximum number of entries held before LRU eviction.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Default TTL (none - entries live until evicted or removed).
pub const DEFAULT_TTL: Option<Duration> = None;

/// Configuration for an [`ExpiringCache`](crate::ExpiringCache).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before the least recently used one is evicted.
    pub max_entries: usize,

    /// Optional time-to-live, measured from insertion.
    /// Reads do not extend an entry's lifetime.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of entries.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Set the TTL for entries.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Disable TTL (entries don't expire based on time).
    pub fn without_ttl(mut self) -> Self {
        self.ttl = None;
        self
    }

    /// Check that the configuration describes a usable cache.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(Error::InvalidConfig(
                "max_entries must be at least 1".to_string(),
            ));
        }
        if self.ttl == Some(Duration::ZERO) {
            return Err(Error::InvalidConfig(
                "ttl must be non-zero (use without_ttl to disable expiry)".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.max_entries, DEFAULT_MAX_ENTRIES);
        assert!(config.ttl.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::new()
            .with_max_entries(5)
            .with_ttl(Duration::from_secs(30));
        assert_eq!(config.max_entries, 5);
        assert_eq!(config.ttl, Some(Duration::from_secs(30)));

        let config = config.without_ttl();
        assert!(config.ttl.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = CacheConfig::new().with_max_entries(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = CacheConfig::new().with_ttl(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
