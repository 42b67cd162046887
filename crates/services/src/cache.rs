//! Analytics response cache.
//!
//! A bounded map of key → (value, stored-at) with a fixed TTL. Each key owns
//! an async slot lock, so concurrent misses for the same key run the loader
//! once and the other callers wait for its result (single flight). Failed
//! loads are not cached; the next waiter runs its own loader.
//!
//! At capacity, inserting a new key first drops expired entries, then the
//! oldest inserted one.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex as SlotLock;
use tokio::time::Instant;
use tracing::{debug, trace};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CAPACITY: usize = 512;

struct Stored<V> {
    value: V,
    stored_at: Instant,
}

type Slot<V> = Arc<SlotLock<Option<Stored<V>>>>;

struct Entry<V> {
    slot: Slot<V>,
    inserted_at: Instant,
}

pub struct ResponseCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<K, V> Default for ResponseCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl<K, V> ResponseCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, stored: &Stored<V>) -> bool {
        stored.stored_at.elapsed() < self.ttl
    }

    /// The cached value for `key` if present and fresh.
    ///
    /// Never waits: a key whose load is in flight reports a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let slot = self.entries().get(key).map(|e| Arc::clone(&e.slot))?;
        let guard = slot.try_lock().ok()?;
        guard
            .as_ref()
            .filter(|stored| self.is_fresh(stored))
            .map(|stored| stored.value.clone())
    }

    /// Return the fresh cached value for `key`, or run `load` and cache its result.
    ///
    /// # Errors
    /// Returns the loader's error; nothing is cached in that case.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot_for(key);
        let mut guard = slot.lock().await;

        if let Some(stored) = guard.as_ref() {
            if self.is_fresh(stored) {
                trace!("cache hit");
                return Ok(stored.value.clone());
            }
        }

        debug!("cache miss, loading");
        let value = load().await?;
        *guard = Some(Stored {
            value: value.clone(),
            stored_at: Instant::now(),
        });
        Ok(value)
    }

    fn slot_for(&self, key: K) -> Slot<V> {
        let mut entries = self.entries();
        if let Some(entry) = entries.get(&key) {
            return Arc::clone(&entry.slot);
        }

        if entries.len() >= self.capacity {
            self.evict(&mut entries);
        }

        let slot: Slot<V> = Arc::new(SlotLock::new(None));
        entries.insert(
            key,
            Entry {
                slot: Arc::clone(&slot),
                inserted_at: Instant::now(),
            },
        );
        slot
    }

    fn evict(&self, entries: &mut HashMap<K, Entry<V>>) {
        // Slots that are mid-load are locked and never count as expired.
        entries.retain(|_, entry| match entry.slot.try_lock() {
            Ok(guard) => guard.as_ref().is_some_and(|stored| self.is_fresh(stored)),
            Err(_) => true,
        });

        if entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                entries.remove(&key);
            }
        }
    }

    /// Drop `key`. An in-flight load for it still completes but is not kept.
    pub fn invalidate(&self, key: &K) {
        self.entries().remove(key);
    }

    /// Drop every key matching `pred`.
    pub fn invalidate_where(&self, pred: impl Fn(&K) -> bool) {
        self.entries().retain(|key, _| !pred(key));
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Cache = ResponseCache<&'static str, u32>;

    #[tokio::test(start_paused = true)]
    async fn fresh_values_are_served_from_cache() {
        let cache = Cache::new(Duration::from_secs(60), 8);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v: Result<u32, ()> = cache
                .get_or_try_insert_with("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(v, Ok(7));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&"k"), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_values_are_reloaded() {
        let cache = Cache::new(Duration::from_secs(60), 8);
        let _ = cache
            .get_or_try_insert_with("k", || async { Ok::<_, ()>(1) })
            .await;

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get(&"k"), None);

        let v = cache
            .get_or_try_insert_with("k", || async { Ok::<_, ()>(2) })
            .await;
        assert_eq!(v, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_misses_load_once() {
        let cache = Arc::new(Cache::new(Duration::from_secs(60), 8));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_try_insert_with("kpis", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<_, ()>(42)
                    })
                    .await
            }));
        }

        for h in handles {
            assert_eq!(h.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_loads_are_not_cached() {
        let cache = Cache::new(Duration::from_secs(60), 8);
        let err = cache
            .get_or_try_insert_with("k", || async { Err::<u32, _>("boom") })
            .await;
        assert_eq!(err, Err("boom"));
        assert_eq!(cache.get(&"k"), None);

        let ok = cache
            .get_or_try_insert_with("k", || async { Ok::<_, &str>(3) })
            .await;
        assert_eq!(ok, Ok(3));
    }

    #[tokio::test(start_paused = true)]
    async fn capacity_evicts_expired_then_oldest() {
        let cache = Cache::new(Duration::from_secs(60), 2);
        let _ = cache.get_or_try_insert_with("a", || async { Ok::<_, ()>(1) }).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        let _ = cache.get_or_try_insert_with("b", || async { Ok::<_, ()>(2) }).await;
        tokio::time::advance(Duration::from_secs(1)).await;

        let _ = cache.get_or_try_insert_with("c", || async { Ok::<_, ()>(3) }).await;
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));

        tokio::time::advance(Duration::from_secs(59)).await;
        // "b" has expired, "c" has not.
        let _ = cache.get_or_try_insert_with("d", || async { Ok::<_, ()>(4) }).await;
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"c"), Some(3));
        assert_eq!(cache.get(&"d"), Some(4));
    }

    #[tokio::test]
    async fn invalidation_drops_matching_keys() {
        let cache: ResponseCache<(u8, &'static str), u32> =
            ResponseCache::new(Duration::from_secs(60), 8);
        for (school, name) in [(1, "kpis"), (1, "funnel"), (2, "kpis")] {
            let _ = cache
                .get_or_try_insert_with((school, name), || async { Ok::<_, ()>(0) })
                .await;
        }

        cache.invalidate_where(|(school, _)| *school == 1);
        assert_eq!(cache.len(), 1);

        cache.invalidate(&(2, "kpis"));
        assert!(cache.is_empty());
    }
}
