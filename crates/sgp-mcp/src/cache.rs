//! TTL cache for successful responses.
//!
//! Backed by `moka`, with a per-entry TTL so call sites may override the
//! default. Expired entries are never returned. Capacity is bounded by
//! `max_keys`; a full cache evicts its least recently used entry, so a fresh
//! write is always kept.

use std::fmt::Display;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use moka::policy::EvictionPolicy;

use crate::models::ResponseEnvelope;

/// Build a deterministic `a:b:c` key from heterogeneous parts.
///
/// ```
/// use sgp_mcp::cache::generate_key;
///
/// assert_eq!(generate_key(["onu_details", "123"]), "onu_details:123");
/// assert_eq!(sgp_mcp::cache_key!("onus", 1, 20), "onus:1:20");
/// ```
pub fn generate_key<I>(parts: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    parts.into_iter().map(|p| p.to_string()).collect::<Vec<_>>().join(":")
}

/// [`generate_key`] over mixed string and number parts.
#[macro_export]
macro_rules! cache_key {
    ($($part:expr),+ $(,)?) => {
        $crate::cache::generate_key([$(&$part as &dyn ::std::fmt::Display),+])
    };
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: ResponseEnvelope,
    ttl: Duration,
}

struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Keyed TTL store for response envelopes. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<String, CacheEntry>,
    default_ttl: Duration,
}

impl ResponseCache {
    /// Create a cache holding at most `max_keys` entries. When full, the least
    /// recently used entry makes room for a new one.
    #[must_use]
    pub fn new(default_ttl: Duration, max_keys: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_keys)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(EntryTtl)
            .build();
        Self { inner, default_ttl }
    }

    /// Cached envelope, if present and not expired.
    pub async fn get(&self, key: &str) -> Option<ResponseEnvelope> {
        self.inner.get(key).await.map(|entry| entry.value)
    }

    /// Store `value` for `ttl` (or the default TTL).
    ///
    /// Returns `false` without storing when the effective TTL is zero.
    pub async fn set(
        &self,
        key: impl Into<String>,
        value: ResponseEnvelope,
        ttl: Option<Duration>,
    ) -> bool {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl.is_zero() {
            return false;
        }

        self.inner.insert(key.into(), CacheEntry { value, ttl }).await;
        true
    }

    /// Remove an entry. Returns whether one was present.
    pub async fn delete(&self, key: &str) -> bool {
        self.inner.remove(key).await.is_some()
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Keys of all live entries, in no particular order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.iter().map(|(key, _)| key.as_ref().clone()).collect()
    }

    /// Approximate entry count. Exact after [`ResponseCache::sync`].
    #[must_use]
    pub fn len(&self) -> u64 {
        self.inner.entry_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    /// Apply pending evictions and expirations.
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }

    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.inner.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
