use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// How long a response stays fresh
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Max number of keys held at once
pub const DEFAULT_CAPACITY: usize = 50;

/// A cached payload plus the moment it was written
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub written_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.written_at) <= ttl
    }
}

/// In-memory response cache with a TTL and a hard entry cap
///
/// Reads never bump recency, so once the cap is hit the entry that was
/// written longest ago goes first. Stale entries are dropped lazily on read.
///
/// Time comes from `tokio::time::Instant`, which means tests can pause the
/// clock and jump past the TTL instead of sleeping.
pub struct ExpiringCache<V> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> ExpiringCache<V> {
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_TTL, DEFAULT_CAPACITY)
    }

    pub fn with_settings(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Fresh value for `key`, or `None` (purging the entry if it went stale)
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        let now = Instant::now();

        match entries.peek(key).map(|entry| entry.is_fresh(self.ttl, now)) {
            Some(true) => {
                debug!("Cache hit for {}", key);
                entries.peek(key).map(|entry| entry.value.clone())
            }
            Some(false) => {
                debug!("Cache entry {} expired, purging", key);
                entries.pop(key);
                None
            }
            None => {
                debug!("Cache miss for {}", key);
                None
            }
        }
    }

    /// Insert or replace `key`; evicts the oldest write when over capacity
    pub fn put(&self, key: &str, value: V) {
        let mut entries = self.lock();
        let entry = CacheEntry {
            value,
            written_at: Instant::now(),
        };

        if let Some((evicted, _)) = entries.push(key.to_string(), entry) {
            if evicted != key {
                debug!("Cache full, evicted {}", evicted);
            }
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of entries currently held, stale ones included until read
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is present and fresh, without purging anything
    pub fn contains_fresh(&self, key: &str) -> bool {
        let entries = self.lock();
        entries
            .peek(key)
            .map(|entry| entry.is_fresh(self.ttl, Instant::now()))
            .unwrap_or(false)
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry<V>>> {
        // Every write is a full replace, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V: Clone> Default for ExpiringCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
