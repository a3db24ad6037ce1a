use crate::config::CacheConfig;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;

// Cache entry with expiration support
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    last_access: Instant,
}

impl<V: Clone> CacheEntry<V> {
    fn new(value: V) -> Self {
        let now = Instant::now();

        Self {
            value,
            created_at: now,
            last_access: now,
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }

    fn access(&mut self) -> V {
        self.last_access = Instant::now();
        self.value.clone()
    }
}

// Statistics for cache monitoring
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

struct Inner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    stats: CacheStats,
}

/// Bounded in-memory cache.
///
/// Holds at most `max_size` entries, evicting the least recently used one on
/// overflow. Entries older than the configured expiration are dropped on read
/// and by [`InmemoryCache::cleanup_expired`]. A cache whose config type is not
/// `"memory"` stores nothing.
#[derive(Clone)]
pub struct InmemoryCache<K, V> {
    inner: Arc<Mutex<Inner<K, V>>>,
    max_size: usize,
    ttl: Duration,
    enabled: bool,
}

impl<K, V> InmemoryCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(config: &CacheConfig) -> Self {
        tracing::info!(
            "Initializing in-memory cache with max_size: {}, expiration: {}s",
            config.max_size,
            config.expiration
        );

        let mut cache = Self::with_ttl(
            config.max_size as usize,
            Duration::from_secs(u64::from(config.expiration)),
        );
        cache.enabled = config.r#type == "memory" && config.max_size > 0;
        cache
    }

    pub fn with_ttl(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            })),
            max_size,
            ttl,
            enabled: max_size > 0,
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::with_ttl(0, Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, key: &K) -> Option<V> {
        if !self.enabled {
            return None;
        }

        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(e) => {
                tracing::error!("Failed to acquire cache lock for key {:?}: {}", key, e);
                return None;
            }
        };

        let Inner { entries, stats } = &mut *inner;

        let expired = match entries.get(key) {
            Some(entry) => entry.is_expired(self.ttl),
            None => {
                tracing::debug!("Cache miss for key: {:?}", key);
                stats.misses += 1;
                return None;
            }
        };

        if expired {
            tracing::debug!("Cache entry expired for key: {:?}", key);
            entries.remove(key);
            stats.expirations += 1;
            stats.misses += 1;
            return None;
        }

        tracing::debug!("Cache hit for key: {:?}", key);
        stats.hits += 1;
        entries.get_mut(key).map(CacheEntry::access)
    }

    pub fn insert(&self, key: K, value: V) {
        if !self.enabled {
            return;
        }

        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(e) => {
                tracing::error!("Failed to acquire cache lock for insert of {:?}: {}", key, e);
                return;
            }
        };

        let Inner { entries, stats } = &mut *inner;

        if entries.len() >= self.max_size && !entries.contains_key(&key) {
            let lru_key = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone());

            if let Some(lru_key) = lru_key {
                entries.remove(&lru_key);
                stats.evictions += 1;
                tracing::debug!("Evicted LRU cache entry: {:?}", lru_key);
            }
        }

        if entries.insert(key.clone(), CacheEntry::new(value)).is_some() {
            tracing::debug!("Updated existing cache entry: {:?}", key);
        } else {
            tracing::debug!("Inserted new cache entry: {:?}", key);
        }

        stats.inserts += 1;
    }

    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            let size = inner.entries.len();
            inner.entries.clear();
            inner.stats = CacheStats::default();
            tracing::info!("Cleared cache ({} entries)", size);
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.entries.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner
            .lock()
            .map(|inner| inner.stats.clone())
            .unwrap_or_default()
    }

    pub fn cleanup_expired(&self) {
        let Ok(mut inner) = self.inner.lock() else {
            tracing::error!("Failed to acquire lock for cache cleanup");
            return;
        };

        let ttl = self.ttl;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(ttl));
        let expired = before - inner.entries.len();

        if expired > 0 {
            inner.stats.expirations += expired as u64;
            tracing::debug!("Cleaned up {} expired cache entries", expired);
        }
    }
}

impl<K, V> InmemoryCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Periodically drops expired entries until the runtime shuts down.
    pub async fn run_cleanup(self, period: Duration) {
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;
            tracing::debug!("Starting periodic cache cleanup");
            self.cleanup_expired();
        }
    }
}
