//! Bounded in-memory cache with LRU eviction and TTL expiry.
//!
//! This crate provides the storage primitive behind Tessera's flow store:
//! - LRU eviction so the number of live entries never exceeds a fixed capacity
//! - Optional TTL measured from insertion, so abandoned entries age out
//! - An atomic [`ExpiringCache::take`] that removes and returns an entry
//!   under a single write lock
//!
//! # Example
//!
//! ```rust,ignore
//! use tessera_session::{CacheConfig, ExpiringCache};
//!
//! let config = CacheConfig::default()
//!     .with_max_entries(1000)
//!     .with_ttl(Duration::from_secs(600));
//!
//! let cache = ExpiringCache::new(config)?;
//! cache.insert("state-1", pending).await;
//! let taken = cache.take("state-1").await;
//! ```

mod cache;
mod config;
mod error;

pub use cache::{CacheStats, ExpiringCache};
pub use config::CacheConfig;
pub use error::{Error, Result};
