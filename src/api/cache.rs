//! Query keys and the composite cache for user data.

use sha2::{Digest, Sha256};

use crate::cache::{QueryCache, QueryKey};

use super::types::{User, UsersPage};

// ============================================================================
// Query key types
// ============================================================================

/// Query key types for user API calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UsersQueryKey {
  /// One page of the user list
  Users { page: u32 },
  /// A single user by id
  User { id: u64 },
}

impl QueryKey for UsersQueryKey {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::Users { page } => format!("users:{}", page),
      Self::User { id } => format!("user:{}", id),
    };

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
  }

  fn description(&self) -> String {
    match self {
      Self::Users { page } => format!("users page {}", page),
      Self::User { id } => format!("user {}", id),
    }
  }

  fn resource(&self) -> &'static str {
    match self {
      Self::Users { .. } => "users",
      Self::User { .. } => "user",
    }
  }
}

// ============================================================================
// Composite cache
// ============================================================================

/// Everything the dashboard knows about users: list pages and single users.
///
/// Owned explicitly and handed to the reconciliation functions; there is no
/// process-wide cache.
#[derive(Debug, Default)]
pub struct UsersCache {
  pub pages: QueryCache<UsersQueryKey, UsersPage>,
  pub users: QueryCache<UsersQueryKey, User>,
}

impl UsersCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn pages_mut(&mut self) -> &mut QueryCache<UsersQueryKey, UsersPage> {
    &mut self.pages
  }

  pub fn users_mut(&mut self) -> &mut QueryCache<UsersQueryKey, User> {
    &mut self.users
  }

  pub fn page(&self, page: u32) -> Option<&UsersPage> {
    self
      .pages
      .get(&UsersQueryKey::Users { page })
      .map(|entry| &entry.value)
  }

  /// Page numbers currently cached, ascending.
  pub fn cached_pages(&self) -> Vec<u32> {
    let mut pages: Vec<u32> = self
      .pages
      .keys()
      .filter_map(|key| match key {
        UsersQueryKey::Users { page } => Some(*page),
        UsersQueryKey::User { .. } => None,
      })
      .collect();
    pages.sort_unstable();
    pages
  }

  /// Mark every list page stale so the next read goes to the network.
  pub fn invalidate_pages(&mut self) -> usize {
    self.pages.invalidate_where(|key| key.resource() == "users")
  }
}

#[cfg(test)]
impl UsersCache {
  pub fn is_page_optimistic(&self, page: u32) -> bool {
    self
      .pages
      .get(&UsersQueryKey::Users { page })
      .is_some_and(|entry| entry.optimistic)
  }

  pub fn user(&self, id: u64) -> Option<&User> {
    self
      .users
      .get(&UsersQueryKey::User { id })
      .map(|entry| &entry.value)
  }
}
