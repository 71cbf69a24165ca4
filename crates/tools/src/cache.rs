//! TTL + LRU cache for upstream metric files.
//!
//! OpenDigger publishes monthly data, so a fetched series stays valid for
//! a long time and several tools in one turn ask for the same files.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::trace;

struct CachedEntry<V> {
    value: Arc<V>,
    cached_at: Instant,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct TtlCache<V> {
    entries: Mutex<LruCache<String, CachedEntry<V>>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> TtlCache<V> {
    /// A zero capacity falls back to a single slot.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<V>> {
        let mut entries = self.entries.lock().await;

        let fresh = match entries.get(key) {
            Some(entry) if entry.cached_at.elapsed() <= self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.pop(key);
                trace!(key, "Cache entry expired");
                None
            }
            None => None,
        };

        match &fresh {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        fresh
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) -> Arc<V> {
        let value = Arc::new(value);
        let mut entries = self.entries.lock().await;
        entries.put(
            key.into(),
            CachedEntry {
                value: value.clone(),
                cached_at: Instant::now(),
            },
        );
        value
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
