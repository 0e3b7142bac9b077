//! Response cache
//!
//! Adapters consult an injected cache before calling the API. At-most-one
//! fetch per key is the cache's business, not the adapter's.

use super::error::AdapterError;
use super::item::{Item, QueryMethod};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Result stored for a cache key
pub type CachedResult = Result<Vec<Item>, AdapterError>;

/// Identifies one adapter query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub adapter: String,
    pub method: QueryMethod,
    pub scope: String,
    pub query: Option<String>,
}

impl CacheKey {
    pub fn new(adapter: &str, method: QueryMethod, scope: &str, query: Option<&str>) -> Self {
        Self {
            adapter: adapter.to_string(),
            method,
            scope: scope.to_string(),
            query: query.map(str::to_string),
        }
    }
}

/// Concurrency-safe cache shared by adapters
pub trait Cache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<CachedResult>;
    fn set(&self, key: CacheKey, value: CachedResult);
}

/// Cache that never stores anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl Cache for NoopCache {
    fn get(&self, _key: &CacheKey) -> Option<CachedResult> {
        None
    }

    fn set(&self, _key: CacheKey, _value: CachedResult) {}
}

struct CacheEntry {
    value: CachedResult,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// In-memory cache with a fixed time-to-live
pub struct MemoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries
    pub fn purge_expired(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            purge(&mut entries);
        }
    }
}

fn purge(entries: &mut HashMap<CacheKey, CacheEntry>) {
    let before = entries.len();
    entries.retain(|_, entry| entry.is_valid());
    if entries.len() < before {
        tracing::trace!("evicted {} expired cache entries", before - entries.len());
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<CachedResult> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;
        if entry.is_valid() {
            tracing::trace!("cache hit: {:?}", key);
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn set(&self, key: CacheKey, value: CachedResult) {
        if let Err(err) = &value {
            if !err.is_cacheable() {
                return;
            }
        }

        if let Ok(mut entries) = self.entries.lock() {
            purge(&mut entries);
            entries.insert(
                key,
                CacheEntry {
                    value,
                    expires_at: Instant::now() + self.ttl,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdp::item::ItemType;
    use serde_json::json;

    fn key(query: &str) -> CacheKey {
        CacheKey::new("gcp-compute-network", QueryMethod::Get, "proj", Some(query))
    }

    #[test]
    fn test_memory_cache_roundtrip() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let item = Item::new(ItemType::new("t"), "proj".to_string(), json!({}));
        cache.set(key("default"), Ok(vec![item.clone()]));

        assert_eq!(cache.get(&key("default")), Some(Ok(vec![item])));
        assert_eq!(cache.get(&key("other")), None);
    }

    #[test]
    fn test_only_not_found_errors_are_cached() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        cache.set(
            key("missing"),
            Err(AdapterError::NotFound {
                url: "u".to_string(),
            }),
        );
        cache.set(
            key("broken"),
            Err(AdapterError::Upstream {
                url: "u".to_string(),
                status: Some(500),
                message: "boom".to_string(),
            }),
        );

        assert!(matches!(cache.get(&key("missing")), Some(Err(AdapterError::NotFound { .. }))));
        assert!(cache.get(&key("broken")).is_none());
    }

    #[test]
    fn test_expired_entries_are_ignored() {
        let cache = MemoryCache::new(Duration::ZERO);
        cache.set(key("default"), Ok(vec![]));
        assert!(cache.get(&key("default")).is_none());
        cache.purge_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_evicts_expired_entries() {
        let cache = MemoryCache::new(Duration::ZERO);
        for query in ["a", "b", "c"] {
            cache.set(key(query), Ok(vec![]));
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_noop_cache_stores_nothing() {
        let cache = NoopCache;
        cache.set(key("default"), Ok(vec![]));
        assert!(cache.get(&key("default")).is_none());
    }
}
