//! Keyed in-memory store of query results.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use super::traits::QueryKey;

/// A cached value with its bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
  pub value: V,
  /// When the value was last written
  pub cached_at: DateTime<Utc>,
  /// Patched locally; the remote store has not confirmed this value
  pub optimistic: bool,
  /// Marked for refetch regardless of age
  pub invalidated: bool,
}

impl<V> CacheEntry<V> {
  fn new(value: V, optimistic: bool) -> Self {
    Self {
      value,
      cached_at: Utc::now(),
      optimistic,
      invalidated: false,
    }
  }

  /// An invalidated entry is always stale; otherwise age decides.
  pub fn is_stale(&self, stale_time: Duration) -> bool {
    self.invalidated || Utc::now() - self.cached_at > stale_time
  }
}

#[derive(Debug, Clone)]
struct Slot<K, V> {
  key: K,
  entry: CacheEntry<V>,
}

/// Query results keyed by [`QueryKey::cache_hash`].
///
/// Iteration order follows the hash, not insertion; callers that care about
/// order (pages) sort on the key themselves.
#[derive(Debug, Clone)]
pub struct QueryCache<K, V> {
  slots: BTreeMap<String, Slot<K, V>>,
}

impl<K, V> Default for QueryCache<K, V> {
  fn default() -> Self {
    Self {
      slots: BTreeMap::new(),
    }
  }
}

impl<K: QueryKey, V> QueryCache<K, V> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &K) -> Option<&CacheEntry<V>> {
    self.slots.get(&key.cache_hash()).map(|slot| &slot.entry)
  }

  pub fn contains(&self, key: &K) -> bool {
    self.slots.contains_key(&key.cache_hash())
  }

  /// Store data confirmed by the remote store.
  pub fn set(&mut self, key: K, value: V) {
    self.insert(key, CacheEntry::new(value, false));
  }

  /// Store locally derived data that the remote store has not confirmed.
  pub fn set_optimistic(&mut self, key: K, value: V) {
    self.insert(key, CacheEntry::new(value, true));
  }

  fn insert(&mut self, key: K, entry: CacheEntry<V>) {
    tracing::trace!(
      key = %key.description(),
      optimistic = entry.optimistic,
      "cache write"
    );
    self.slots.insert(key.cache_hash(), Slot { key, entry });
  }

  /// Patch an entry in place. The entry becomes optimistic and counts as
  /// freshly written, so a refetch cannot replace it before it goes stale
  /// again. Returns false when nothing is cached.
  pub fn update(&mut self, key: &K, f: impl FnOnce(&mut V)) -> bool {
    match self.slots.get_mut(&key.cache_hash()) {
      Some(slot) => {
        f(&mut slot.entry.value);
        slot.entry.optimistic = true;
        slot.entry.cached_at = Utc::now();
        slot.entry.invalidated = false;
        true
      }
      None => false,
    }
  }

  pub fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
    self.slots.remove(&key.cache_hash()).map(|slot| slot.entry)
  }

  /// Remove every entry whose key matches. Returns how many were dropped.
  pub fn remove_where(&mut self, mut pred: impl FnMut(&K) -> bool) -> usize {
    let before = self.slots.len();
    self.slots.retain(|_, slot| !pred(&slot.key));
    before - self.slots.len()
  }

  /// Mark matching entries stale so the next read refetches them.
  pub fn invalidate_where(&mut self, mut pred: impl FnMut(&K) -> bool) -> usize {
    let mut count = 0;
    for slot in self.slots.values_mut() {
      if pred(&slot.key) {
        slot.entry.invalidated = true;
        count += 1;
      }
    }
    count
  }

  pub fn keys(&self) -> impl Iterator<Item = &K> {
    self.slots.values().map(|slot| &slot.key)
  }
}
