//! Process-wide cache of "who is this token" lookups
//!
//! Entries are keyed by the identity service JWT stored in the session and
//! expire on read after a fixed TTL. Nothing sweeps stale entries; they stay
//! in memory until overwritten, invalidated, or the process restarts.

use crate::models::AuthenticatedUser;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// How long a cached user lookup stays valid
pub const USER_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub user: AuthenticatedUser,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    #[must_use]
    pub fn new(user: AuthenticatedUser) -> Self {
        Self {
            user,
            cached_at: Utc::now(),
        }
    }

    /// An entry is fresh while `now - cached_at < ttl`
    ///
    /// A `cached_at` in the future (clock step back) counts as zero elapsed.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
            < ttl
    }
}

/// Shared user cache
///
/// Cloning is cheap and every clone sees the same entries. The lock guards
/// map access only and is never held across a remote call.
#[derive(Clone)]
pub struct UserCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl Default for UserCache {
    fn default() -> Self {
        Self::new()
    }
}

impl UserCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(USER_CACHE_TTL)
    }

    /// Create a cache with a custom TTL
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached user for `token`, if one was stored less than a TTL ago
    pub async fn get(&self, token: &str) -> Option<AuthenticatedUser> {
        let entries = self.entries.read().await;
        let entry = entries.get(token)?;

        if entry.is_fresh_at(Utc::now(), self.ttl) {
            Some(entry.user.clone())
        } else {
            log::debug!("User cache entry expired");
            None
        }
    }

    /// Store `user` for `token`, replacing any previous entry
    pub async fn set(&self, token: &str, user: AuthenticatedUser) {
        let mut entries = self.entries.write().await;
        entries.insert(token.to_string(), CacheEntry::new(user));
    }

    /// Drop the entry for `token`; returns whether one existed
    pub async fn invalidate(&self, token: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(token).is_some()
    }

    /// Drop every entry
    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        let flushed = entries.len();
        entries.clear();
        log::debug!("User cache flushed ({flushed} entries)");
    }

    /// Number of stored entries, stale ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
