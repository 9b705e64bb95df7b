//! Flow store: pending logins and completed sessions keyed by state.
//!
//! Both maps are [`ExpiringCache`]s, so they are capacity-bounded and
//! time-bounded. A state is never a key in both maps at once: completion
//! pops the pending entry before any network call and only then inserts
//! the completed session.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_session::{CacheConfig, ExpiringCache};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::Result;
use crate::provider::UserInfo;

/// Default lifetime of a pending login (10 minutes).
pub const DEFAULT_PENDING_TTL: Duration = Duration::from_secs(600);

/// Default lifetime of a completed session (1 hour).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Default cap on in-flight logins.
pub const DEFAULT_MAX_PENDING: usize = 10_000;

/// Default cap on retained completed sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Default interval between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// ============================================================================
// Entries
// ============================================================================

/// An in-flight login awaiting its callback.
#[derive(Clone)]
pub struct PendingLogin {
    pub state: String,
    /// PKCE verifier; sent only to the token endpoint.
    pub code_verifier: String,
    pub created_at: DateTime<Utc>,
}

impl PendingLogin {
    /// Record a login started now.
    pub fn new(state: impl Into<String>, code_verifier: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            code_verifier: code_verifier.into(),
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for PendingLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingLogin")
            .field("code_verifier", &"***REDACTED***")
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Tokens and identity produced by a successful callback. Immutable once stored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub access_token: String,
    pub id_token: String,
    pub expires_in: u64,
    pub scope: String,
    pub user: UserInfo,
}

impl std::fmt::Debug for CompletedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletedSession")
            .field("access_token", &"***REDACTED***")
            .field("id_token", &"***REDACTED***")
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("user", &self.user)
            .finish()
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Bounds on the flow store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long a login may stay pending before its callback is refused.
    pub pending_ttl: Duration,
    /// How long a completed session stays readable. `None` keeps it until evicted.
    pub session_ttl: Option<Duration>,
    pub max_pending: usize,
    pub max_sessions: usize,
    /// Interval of the background sweeper started by [`FlowStore::spawn_sweeper`].
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pending_ttl: DEFAULT_PENDING_TTL,
            session_ttl: Some(DEFAULT_SESSION_TTL),
            max_pending: DEFAULT_MAX_PENDING,
            max_sessions: DEFAULT_MAX_SESSIONS,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl = ttl;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_max_pending(mut self, max: usize) -> Self {
        self.max_pending = max;
        self
    }

    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

// ============================================================================
// FlowStore
// ============================================================================

/// Counts of live entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub pending: usize,
    pub sessions: usize,
}

/// Owner of every pending login and completed session.
///
/// Clones share the same underlying maps.
#[derive(Clone)]
pub struct FlowStore {
    pending: ExpiringCache<PendingLogin>,
    completed: ExpiringCache<CompletedSession>,
    sweep_interval: Duration,
}

impl std::fmt::Debug for FlowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowStore")
            .field("sweep_interval", &self.sweep_interval)
            .finish_non_exhaustive()
    }
}

impl FlowStore {
    /// Create an empty store.
    pub fn new(config: StoreConfig) -> Result<Self> {
        let pending = ExpiringCache::new(
            CacheConfig::new()
                .with_max_entries(config.max_pending)
                .with_ttl(config.pending_ttl),
        )?;

        let mut session_cache = CacheConfig::new().with_max_entries(config.max_sessions);
        if let Some(ttl) = config.session_ttl {
            session_cache = session_cache.with_ttl(ttl);
        }
        let completed = ExpiringCache::new(session_cache)?;

        Ok(Self {
            pending,
            completed,
            sweep_interval: config.sweep_interval,
        })
    }

    /// Record a pending login under its state.
    pub async fn put_pending(&self, login: PendingLogin) {
        let state = login.state.clone();
        self.pending.insert(&state, login).await;
        debug!("Pending login recorded");
    }

    /// Atomically remove and return the pending login for `state`.
    ///
    /// At most one caller ever receives a given entry. Expired entries read
    /// as absent.
    pub async fn pop_pending(&self, state: &str) -> Option<PendingLogin> {
        let login = self.pending.take(state).await?;
        debug!(
            age_ms = (Utc::now() - login.created_at).num_milliseconds(),
            "Pending login consumed"
        );
        Some(login)
    }

    /// Store a completed session under `state`.
    ///
    /// Any pending entry still keyed by `state` is dropped first.
    pub async fn put_completed(&self, state: &str, session: CompletedSession) {
        self.pending.remove(state).await;
        self.completed.insert(state, session).await;
    }

    /// Get the completed session for `state`, if any.
    pub async fn get_completed(&self, state: &str) -> Option<CompletedSession> {
        self.completed.get(state).await
    }

    /// Drop expired entries from both maps.
    pub async fn sweep_expired(&self) -> StoreStats {
        let swept = StoreStats {
            pending: self.pending.cleanup_expired().await,
            sessions: self.completed.cleanup_expired().await,
        };
        if swept.pending + swept.sessions > 0 {
            debug!(
                pending = swept.pending,
                sessions = swept.sessions,
                "Swept expired flow entries"
            );
        }
        swept
    }

    /// Spawn a task that sweeps expired entries every `sweep_interval`.
    ///
    /// The task runs until the returned handle is aborted or the runtime stops.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let store = self.clone();
        let period = self.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // first tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.sweep_expired().await;
            }
        })
    }

    /// Current number of stored entries in each map.
    pub async fn stats(&self) -> StoreStats {
        StoreStats {
            pending: self.pending.len().await,
            sessions: self.completed.len().await,
        }
    }
}
