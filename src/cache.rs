use std::hash::Hash;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Small in-memory TTL cache. Entries expire lazily on read; writers that
/// change the underlying data call `invalidate_all`.
#[derive(Debug)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    entries: DashMap<K, Entry<V>>,
    ttl: Duration,
}

#[derive(Debug)]
struct Entry<V> {
    stored_at: Instant,
    value: V,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.stored_at.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn put(&self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                stored_at: Instant::now(),
                value,
            },
        );
    }

    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_returns_within_ttl() {
        let cache: TtlCache<u64, String> = TtlCache::new(Duration::from_secs(60));
        cache.put(1, "one".to_string());
        assert_eq!(cache.get(&1), Some("one".to_string()));
        assert_eq!(cache.get(&2), None);
    }

    #[test]
    fn expired_entries_are_dropped_on_read() {
        let cache: TtlCache<u64, String> = TtlCache::new(Duration::from_millis(10));
        cache.put(1, "one".to_string());
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get(&1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_all_clears_everything() {
        let cache: TtlCache<u64, u32> = TtlCache::new(Duration::from_secs(60));
        cache.put(1, 10);
        cache.put(2, 20);
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
