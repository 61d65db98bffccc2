//! Cache layer that orchestrates caching logic with network fetching.

use chrono::Duration;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;

use super::store::QueryCache;
use super::traits::{CacheResult, QueryKey};
use crate::error::Result;

/// Picks one typed store out of a composite cache.
pub type Selector<C, K, V> = fn(&mut C) -> &mut QueryCache<K, V>;

/// Cache layer that manages caching logic and network fetching.
///
/// `C` is the composite cache shared with whoever patches it after
/// mutations. The lock is never held across an `.await`.
pub struct CacheLayer<C> {
  cache: Arc<Mutex<C>>,
  /// How long before cached data is considered stale
  stale_time: Duration,
}

impl<C> CacheLayer<C> {
  /// Create a new cache layer over the given shared cache.
  pub fn new(cache: Arc<Mutex<C>>) -> Self {
    Self {
      cache,
      stale_time: Duration::minutes(5),
    }
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  /// Run `f` with exclusive access to the cache.
  pub fn with<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
    let mut guard = self.cache.lock();
    f(&mut guard)
  }

  /// Fetch with cache-first strategy.
  ///
  /// 1. Check cache - if fresh, return immediately
  /// 2. If stale/missing, fetch from network
  /// 3. On network failure, return stale cache (offline mode)
  /// 4. Update cache with confirmed data
  pub async fn fetch<K, V, F, Fut>(
    &self,
    select: Selector<C, K, V>,
    key: K,
    fetcher: F,
  ) -> Result<CacheResult<V>>
  where
    K: QueryKey,
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V>>,
  {
    let cached = {
      let mut guard = self.cache.lock();
      select(&mut guard).get(&key).cloned()
    };

    if let Some(entry) = cached {
      if !entry.is_stale(self.stale_time) {
        return Ok(CacheResult::from_cache(
          entry.value,
          entry.cached_at,
          entry.optimistic,
          false,
        ));
      }

      // Cache is stale, try to fetch from network
      match fetcher().await {
        Ok(data) => {
          self.store(select, key, data.clone());
          Ok(CacheResult::from_network(data))
        }
        Err(e) => {
          tracing::warn!(key = %key.description(), error = %e, "refetch failed, serving stale cache");
          Ok(CacheResult::offline(
            entry.value,
            entry.cached_at,
            entry.optimistic,
          ))
        }
      }
    } else {
      // No cache, must fetch from network
      let data = fetcher().await?;
      self.store(select, key, data.clone());
      Ok(CacheResult::from_network(data))
    }
  }

  fn store<K: QueryKey, V>(&self, select: Selector<C, K, V>, key: K, value: V) {
    let mut guard = self.cache.lock();
    select(&mut guard).set(key, value);
  }
}

impl<C> Clone for CacheLayer<C> {
  fn clone(&self) -> Self {
    Self {
      cache: Arc::clone(&self.cache),
      stale_time: self.stale_time,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::CacheSource;
  use crate::error::Error;
  use std::sync::atomic::{AtomicU32, Ordering};

  #[derive(Clone, Debug)]
  struct Key(u32);

  impl QueryKey for Key {
    fn cache_hash(&self) -> String {
      self.0.to_string()
    }

    fn description(&self) -> String {
      format!("key {}", self.0)
    }

    fn resource(&self) -> &'static str {
      "key"
    }
  }

  #[derive(Default)]
  struct Composite {
    numbers: QueryCache<Key, u32>,
  }

  fn numbers(c: &mut Composite) -> &mut QueryCache<Key, u32> {
    &mut c.numbers
  }

  fn layer() -> CacheLayer<Composite> {
    CacheLayer::new(Arc::new(Mutex::new(Composite::default())))
  }

  #[tokio::test]
  async fn test_miss_fetches_then_hits() {
    let layer = layer();
    let counter = AtomicU32::new(0);
    let calls = &counter;

    let first = layer
      .fetch(numbers, Key(1), move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(7)
      })
      .await
      .unwrap();
    assert_eq!(first.data, 7);
    assert_eq!(first.source, CacheSource::Network);

    let second = layer
      .fetch(numbers, Key(1), move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(8)
      })
      .await
      .unwrap();
    assert_eq!(second.data, 7);
    assert_eq!(second.source, CacheSource::CacheFresh);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_miss_propagates_error() {
    let layer = layer();
    let result = layer
      .fetch(numbers, Key(1), || async { Err(Error::remote(500, "boom")) })
      .await;
    assert!(result.is_err());
    assert!(layer.with(|c| c.numbers.keys().next().is_none()));
  }

  #[tokio::test]
  async fn test_stale_refetch_failure_serves_offline() {
    let layer = layer();
    layer.with(|c| {
      c.numbers.set_optimistic(Key(1), 3);
      c.numbers.invalidate_where(|_| true);
    });

    let result = layer
      .fetch(numbers, Key(1), || async { Err(Error::remote(503, "down")) })
      .await
      .unwrap();
    assert_eq!(result.data, 3);
    assert_eq!(result.source, CacheSource::Offline);
    assert!(result.optimistic);
  }

  #[tokio::test]
  async fn test_stale_refetch_confirms_entry() {
    let layer = layer();
    layer.with(|c| {
      c.numbers.set_optimistic(Key(1), 3);
      c.numbers.invalidate_where(|_| true);
    });

    let result = layer
      .fetch(numbers, Key(1), || async { Ok(4) })
      .await
      .unwrap();
    assert_eq!(result.data, 4);
    assert_eq!(result.source, CacheSource::Network);

    let entry = layer.with(|c| c.numbers.get(&Key(1)).cloned()).unwrap();
    assert!(!entry.optimistic);
    assert!(!entry.invalidated);
  }
}
