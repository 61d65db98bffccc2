//! Generic in-memory query cache.
//!
//! This module knows nothing about users. It provides:
//! - Query keys with stable hashes and human-readable descriptions
//! - A keyed store whose entries carry a cached-at timestamp and an
//!   `optimistic` flag for locally patched data
//! - A fetch layer that serves fresh entries, refetches stale ones and falls
//!   back to the stale copy when the network is unavailable

mod layer;
mod store;
mod traits;

pub use layer::CacheLayer;
pub use store::{CacheEntry, QueryCache};
pub use traits::{CacheResult, CacheSource, QueryKey};
