//! Shared, time-bounded cache for word lists.
//!
//! The [`SharedCache`] trait mirrors a "get with set callback" primitive: a
//! lookup carries the computation which produces the value on a miss. The
//! cache guarantees that at most one computation per key is in flight;
//! concurrent callers for the same key wait for it and then observe its
//! result. Only values which were actually produced (`Some`) are stored.

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[cfg(test)]
use mock_instant::thread_local::Instant;
#[cfg(not(test))]
use std::time::Instant;

/// A cached word list. Shared, never mutated once stored.
pub type CachedWords = Arc<Vec<String>>;

/// The computation run on a cache miss. `None` means "nothing to cache".
pub type SetCallback<'a> = BoxFuture<'a, Option<CachedWords>>;

/// Keys of the shared cache.
///
/// Global keys are shared by all deployments using the same cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds a key visible to all deployments, e.g. `global:tempuserwordnames:words`.
    pub fn global(keyspace: &str, components: &[&str]) -> Self {
        let mut key = format!("global:{}", keyspace);
        for component in components {
            key.push(':');
            key.push_str(component);
        }

        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A key-value cache with expiration and single-flight recomputation.
#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Returns the unexpired value stored for `key`, if any.
    async fn get(&self, key: &CacheKey) -> Option<CachedWords>;

    /// Returns the unexpired value for `key` or runs `callback` to produce it.
    ///
    /// A produced value is stored for `ttl`. If the callback yields `None`,
    /// nothing is stored and `None` is returned. While a callback runs, other
    /// callers for the same key wait instead of starting their own.
    async fn get_with_set_callback<'a>(
        &'a self,
        key: &'a CacheKey,
        ttl: Duration,
        callback: SetCallback<'a>,
    ) -> Option<CachedWords>;

    /// Removes the value stored for `key`.
    async fn delete(&self, key: &CacheKey);
}

struct CacheEntry {
    value: CachedWords,
    expires_at: Instant,
}

impl CacheEntry {
    fn fresh_value(&self) -> Option<CachedWords> {
        if Instant::now() < self.expires_at {
            Some(self.value.clone())
        } else {
            None
        }
    }
}

type Slot = Arc<tokio::sync::Mutex<Option<CacheEntry>>>;

/// A [`SharedCache`] living in the memory of this process.
///
/// Every key owns an async lock, which is held while its value is being
/// recomputed. Lookups of other keys are not blocked by this.
#[derive(Default)]
pub struct InMemorySharedCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl InMemorySharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &CacheKey) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.clone()).or_default().clone()
    }
}

#[async_trait]
impl SharedCache for InMemorySharedCache {
    async fn get(&self, key: &CacheKey) -> Option<CachedWords> {
        let slot = self.slot(key);
        let entry = slot.lock().await;

        entry.as_ref().and_then(CacheEntry::fresh_value)
    }

    #[tracing::instrument(level = "debug", skip(self, key, callback), fields(key = %key))]
    async fn get_with_set_callback<'a>(
        &'a self,
        key: &'a CacheKey,
        ttl: Duration,
        callback: SetCallback<'a>,
    ) -> Option<CachedWords> {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;

        if let Some(value) = entry.as_ref().and_then(CacheEntry::fresh_value) {
            return Some(value);
        }

        tracing::debug!("Cache miss for '{}', recomputing...", key);
        let value = callback.await;

        *entry = value.clone().map(|value| CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        });

        value
    }

    async fn delete(&self, key: &CacheKey) {
        let slot = self.slot(key);
        *slot.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_instant::thread_local::MockClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn words(words: &[&str]) -> CachedWords {
        Arc::new(words.iter().map(|word| word.to_string()).collect())
    }

    fn counting_callback<'a>(
        calls: &'a AtomicUsize,
        result: Option<CachedWords>,
    ) -> SetCallback<'a> {
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            result
        })
    }

    #[test]
    fn global_key_joins_components() {
        assert_eq!(
            CacheKey::global("tempuserwordnames", &["words"]).as_str(),
            "global:tempuserwordnames:words"
        );
        assert_eq!(
            CacheKey::global("tempuserwordnames", &[]).to_string(),
            "global:tempuserwordnames"
        );
    }

    #[tokio::test]
    async fn stores_computed_value_until_expiry() {
        let cache = InMemorySharedCache::new();
        let key = CacheKey::global("test", &["expiry"]);
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_with_set_callback(&key, HOUR, counting_callback(&calls, Some(words(&["a"]))))
            .await;
        let second = cache
            .get_with_set_callback(&key, HOUR, counting_callback(&calls, Some(words(&["b"]))))
            .await;

        assert_eq!(first, Some(words(&["a"])));
        assert_eq!(second, Some(words(&["a"])));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        MockClock::advance(HOUR + Duration::from_secs(1));

        assert_eq!(cache.get(&key).await, None);
        let third = cache
            .get_with_set_callback(&key, HOUR, counting_callback(&calls, Some(words(&["c"]))))
            .await;
        assert_eq!(third, Some(words(&["c"])));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_store_missing_values() {
        let cache = InMemorySharedCache::new();
        let key = CacheKey::global("test", &["missing"]);
        let calls = AtomicUsize::new(0);

        assert_eq!(
            cache
                .get_with_set_callback(&key, HOUR, counting_callback(&calls, None))
                .await,
            None
        );
        assert_eq!(cache.get(&key).await, None);

        cache
            .get_with_set_callback(&key, HOUR, counting_callback(&calls, Some(words(&["a"]))))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get(&key).await, Some(words(&["a"])));
    }

    #[tokio::test]
    async fn delete_forces_recomputation() {
        let cache = InMemorySharedCache::new();
        let key = CacheKey::global("test", &["delete"]);
        let calls = AtomicUsize::new(0);

        cache
            .get_with_set_callback(&key, HOUR, counting_callback(&calls, Some(words(&["a"]))))
            .await;
        cache.delete(&key).await;
        let value = cache
            .get_with_set_callback(&key, HOUR, counting_callback(&calls, Some(words(&["b"]))))
            .await;

        assert_eq!(value, Some(words(&["b"])));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_compute_once() {
        let cache = InMemorySharedCache::new();
        let key = CacheKey::global("test", &["concurrent"]);
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let lookups = (0..10).map(|_| {
            cache.get_with_set_callback(
                &key,
                HOUR,
                Box::pin(async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    Some(words(&["a"]))
                }),
            )
        });
        let results = futures_util::future::join_all(lookups).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|value| value == &Some(words(&["a"]))));
    }
}
