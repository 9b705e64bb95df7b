//! Expiring cache with LRU eviction and TTL support.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::error::{Error, Result};

/// A stored value and the instant it was inserted.
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.duration_since(self.inserted_at) > ttl)
    }
}

/// Keyed cache with LRU eviction and optional TTL.
///
/// Keys may be secrets and are never logged.
///
/// This cache provides:
/// - LRU eviction when max capacity is reached
/// - Optional TTL-based expiration measured from insertion
/// - Atomic remove-and-return via [`take`](Self::take)
/// - Thread-safe access via RwLock
///
/// Expired entries are invisible to every read path even before
/// [`cleanup_expired`](Self::cleanup_expired) physically drops them.
/// Clones share the same underlying storage.
pub struct ExpiringCache<V> {
    inner: Arc<RwLock<LruCache<String, Entry<V>>>>,
    config: CacheConfig,
}

impl<V: Clone + Send + Sync> ExpiringCache<V> {
    /// Create a new cache, rejecting configurations with zero capacity or zero TTL.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let cap = NonZeroUsize::new(config.max_entries)
            .ok_or_else(|| Error::InvalidConfig("max_entries must be at least 1".to_string()))?;

        Ok(Self {
            inner: Arc::new(RwLock::new(LruCache::new(cap))),
            config,
        })
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get the number of stored entries (expired entries count until swept).
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Insert an entry, replacing any existing value under the same key.
    ///
    /// The TTL clock restarts on replacement. If the cache is at capacity,
    /// the least recently used entry is evicted.
    pub async fn insert(&self, key: &str, value: V) {
        let mut lru = self.inner.write().await;
        let entry = Entry {
            value,
            inserted_at: Instant::now(),
        };

        if let Some((evicted_key, _)) = lru.push(key.to_string(), entry) {
            if evicted_key != key {
                debug!(capacity = self.config.max_entries, "Evicting LRU entry to make room");
            }
        }

        trace!(cache_size = lru.len(), "Entry inserted into cache");
    }

    /// Atomically remove and return an entry.
    ///
    /// Returns `None` if the key is absent or its TTL has elapsed. An expired
    /// entry is dropped as a side effect. Two concurrent callers racing on the
    /// same key can never both receive the value.
    pub async fn take(&self, key: &str) -> Option<V> {
        let entry = self.inner.write().await.pop(key)?;

        if entry.is_expired(self.config.ttl, Instant::now()) {
            debug!("Entry expired, discarding on take");
            return None;
        }

        Some(entry.value)
    }

    /// Get a clone of an entry without updating LRU order or TTL.
    pub async fn get(&self, key: &str) -> Option<V> {
        let lru = self.inner.read().await;
        lru.peek(key)
            .filter(|entry| !entry.is_expired(self.config.ttl, Instant::now()))
            .map(|entry| entry.value.clone())
    }

    /// Check if a live (non-expired) entry exists.
    pub async fn contains(&self, key: &str) -> bool {
        let lru = self.inner.read().await;
        lru.peek(key)
            .is_some_and(|entry| !entry.is_expired(self.config.ttl, Instant::now()))
    }

    /// Remove an entry regardless of expiry, returning whether one was present.
    pub async fn remove(&self, key: &str) -> bool {
        self.inner.write().await.pop(key).is_some()
    }

    /// Drop all expired entries.
    ///
    /// Returns the number of entries that were removed.
    pub async fn cleanup_expired(&self) -> usize {
        if self.config.ttl.is_none() {
            return 0;
        }

        let mut lru = self.inner.write().await;
        let now = Instant::now();
        let expired: Vec<String> = lru
            .iter()
            .filter(|(_, entry)| entry.is_expired(self.config.ttl, now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            lru.pop(key);
        }

        let count = expired.len();
        if count > 0 {
            debug!(count = count, "Cleaned up expired entries");
        }

        count
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.inner.read().await.len(),
            capacity: self.config.max_entries,
            ttl: self.config.ttl,
        }
    }
}

impl<V> Clone for ExpiringCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config.clone(),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of stored entries.
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,

    /// Configured TTL, if any.
    pub ttl: Option<Duration>,
}
