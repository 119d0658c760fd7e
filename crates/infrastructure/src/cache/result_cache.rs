use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, instrument};

use super::stats::CacheStats;
use crate::observability::metrics_recorder;

/// A cached value together with its lifetime
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    /// An entry expires once strictly more than `ttl` has elapsed
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }
}

/// Key/value cache with per-entry time-to-live.
///
/// Cloning the cache is cheap and every clone shares the same storage.
/// No lock is ever held across an `.await`.
#[derive(Clone)]
pub struct ResultCache<V = Value> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    stats: Arc<RwLock<CacheStats>>,
    default_ttl: Duration,
}

impl<V> ResultCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(CacheStats::default())),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up a value. An expired entry is removed and reported as a miss.
    #[instrument(skip(self))]
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();

        let (value, expired) = match self.entries.read().get(key) {
            Some(entry) if entry.is_expired(now) => (None, true),
            Some(entry) => (Some(entry.value.clone()), false),
            None => (None, false),
        };

        let mut remaining = None;
        if expired {
            let mut entries = self.entries.write();
            // A concurrent put may have refreshed the entry in the meantime
            if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
                entries.remove(key);
                remaining = Some(entries.len());
            }
        }

        let mut stats = self.stats.write();
        if value.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        if let Some(len) = remaining {
            stats.expirations += 1;
            stats.entries = len;
            debug!(key, "cache entry expired");
        }
        drop(stats);

        metrics_recorder::record_cache_lookup(value.is_some());
        value
    }

    /// Store a value, overwriting any existing entry for `key`
    #[instrument(skip(self, value))]
    pub fn put(&self, key: &str, value: V, ttl: Duration) {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        let len = entries.len();
        drop(entries);

        let mut stats = self.stats.write();
        stats.sets += 1;
        stats.entries = len;
    }

    /// Store a value with the configured default TTL
    pub fn put_default(&self, key: &str, value: V) {
        self.put(key, value, self.default_ttl);
    }

    /// Return the cached value for `key`, or run `compute` and cache its
    /// successful result. Errors are returned as-is and never cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = compute().await?;
        self.put(key, value.clone(), ttl);
        Ok(value)
    }

    /// Remove an entry, returning whether it existed
    pub fn invalidate(&self, key: &str) -> bool {
        let mut entries = self.entries.write();
        let removed = entries.remove(key).is_some();
        let len = entries.len();
        drop(entries);

        if removed {
            let mut stats = self.stats.write();
            stats.invalidations += 1;
            stats.entries = len;
        }

        removed
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let cleared = entries.len() as u64;
        entries.clear();
        drop(entries);

        let mut stats = self.stats.write();
        stats.invalidations += cleared;
        stats.entries = 0;
    }

    /// Number of stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    /// Remove every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        let len = entries.len();
        drop(entries);

        let mut stats = self.stats.write();
        stats.expirations += removed as u64;
        stats.entries = len;

        removed
    }
}
