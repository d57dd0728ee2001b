//! Session-scoped response memo with a fixed time-to-live.
//!
//! Entries expire lazily: an expired entry is dropped by the `get` that finds
//! it. There is no capacity bound and no background sweeper.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

#[derive(Debug, Clone)]
pub struct ResponseCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Value stored under `key` if it is younger than the TTL.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.inserted_at.elapsed() >= self.ttl {
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Stores `value`, replacing any previous entry and restarting its clock.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time;

    #[tokio::test(start_paused = true)]
    async fn returns_value_until_ttl_elapses() {
        let mut cache = ResponseCache::new();
        cache.set("all_recipes", 42);
        assert_eq!(cache.get("all_recipes"), Some(42));

        time::advance(DEFAULT_TTL - Duration::from_millis(1)).await;
        assert_eq!(cache.get("all_recipes"), Some(42));

        time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("all_recipes"), None);
        assert!(cache.is_empty(), "expired entry is evicted by the read");

        cache.set("all_recipes", 43);
        assert_eq!(cache.get("all_recipes"), Some(43));
    }

    #[tokio::test(start_paused = true)]
    async fn set_overwrites_and_restarts_clock() {
        let mut cache = ResponseCache::with_ttl(Duration::from_secs(60));
        cache.set("k", "old");
        time::advance(Duration::from_secs(50)).await;
        cache.set("k", "new");
        time::advance(Duration::from_secs(50)).await;
        assert_eq!(cache.get("k"), Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_is_lazy_and_per_key() {
        let mut cache = ResponseCache::with_ttl(Duration::from_secs(10));
        cache.set("a", 1);
        time::advance(Duration::from_secs(5)).await;
        cache.set("b", 2);
        time::advance(Duration::from_secs(6)).await;

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.len(), 2, "reading a live key leaves the stale one alone");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_drops_everything() {
        let mut cache = ResponseCache::new();
        cache.set("a", 1);
        cache.set("b", 2);
        cache.clear();
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_key_is_absent() {
        let mut cache: ResponseCache<u8> = ResponseCache::new();
        assert_eq!(cache.get("nothing"), None);
    }
}
