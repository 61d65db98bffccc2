//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};

/// A query fingerprint: resource plus page or id.
pub trait QueryKey: Clone + std::fmt::Debug {
  /// Stable, fixed-length key used for storage
  fn cache_hash(&self) -> String;

  /// Human-readable description for logs
  fn description(&self) -> String;

  /// Resource name shared by every key of the same kind (e.g. "users")
  fn resource(&self) -> &'static str;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
  /// Data was patched locally and not yet confirmed by a refetch
  pub optimistic: bool,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
      optimistic: false,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>, optimistic: bool, is_stale: bool) -> Self {
    Self {
      data,
      source: if is_stale {
        CacheSource::CacheStale
      } else {
        CacheSource::CacheFresh
      },
      cached_at: Some(cached_at),
      optimistic,
    }
  }

  /// Create a new cache result for offline mode.
  pub fn offline(data: T, cached_at: DateTime<Utc>, optimistic: bool) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at: Some(cached_at),
      optimistic,
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still considered fresh
  CacheFresh,
  /// Data from cache, considered stale
  CacheStale,
  /// Offline mode - network unavailable, serving cached data
  Offline,
}
