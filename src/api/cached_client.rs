//! Users client that reads through the query cache and reconciles it after
//! every successful write.

use chrono::Duration;
use parking_lot::Mutex;
use std::sync::Arc;
use url::form_urlencoded;

use crate::cache::{CacheLayer, CacheResult};
use crate::error::Result;
use crate::reconcile;
use crate::validation::validate_user_form;

use super::cache::{UsersCache, UsersQueryKey};
use super::types::{User, UserFields, UsersPage};
use super::UsersApi;

const AVATAR_BASE: &str = "https://ui-avatars.com/api/";

/// Generated avatar for a user the remote store has no picture for.
pub fn avatar_url(first_name: &str, last_name: &str) -> String {
  let query = form_urlencoded::Serializer::new(String::new())
    .append_pair("name", &format!("{} {}", first_name.trim(), last_name.trim()))
    .append_pair("background", "random")
    .append_pair("color", "fff")
    .append_pair("size", "256")
    .finish();
  format!("{}?{}", AVATAR_BASE, query)
}

/// Users client with a shared, reconciled cache.
///
/// Reads are served from the cache while fresh. Writes go to the remote
/// store first; only when it accepts them is the cache patched. A failed
/// write leaves the cache exactly as it was.
pub struct CachedUsersClient<A> {
  api: Arc<A>,
  cache: CacheLayer<UsersCache>,
}

impl<A> Clone for CachedUsersClient<A> {
  fn clone(&self) -> Self {
    Self {
      api: Arc::clone(&self.api),
      cache: self.cache.clone(),
    }
  }
}

impl<A: UsersApi> CachedUsersClient<A> {
  pub fn new(api: Arc<A>, stale_time: Duration) -> Self {
    let cache = CacheLayer::new(Arc::new(Mutex::new(UsersCache::new()))).with_stale_time(stale_time);
    Self { api, cache }
  }

  /// One page of users, from cache when fresh.
  pub async fn list_users(&self, page: u32) -> Result<CacheResult<UsersPage>> {
    let api = Arc::clone(&self.api);
    self
      .cache
      .fetch(
        UsersCache::pages_mut,
        UsersQueryKey::Users { page },
        || async move { api.list_users(page).await },
      )
      .await
  }

  /// A single user, from cache when fresh.
  pub async fn get_user(&self, id: u64) -> Result<CacheResult<User>> {
    let api = Arc::clone(&self.api);
    self
      .cache
      .fetch(
        UsersCache::users_mut,
        UsersQueryKey::User { id },
        || async move { api.get_user(id).await },
      )
      .await
  }

  /// Create a user and show it at the top of page 1.
  pub async fn create_user(&self, fields: UserFields) -> Result<User> {
    validate_user_form(&fields.email, &fields.first_name, &fields.last_name)?;

    let created = self.api.create_user(&fields).await.inspect_err(|e| {
      tracing::error!(error = %e, "create user failed");
    })?;

    let user = User {
      id: created.id,
      avatar: avatar_url(&fields.first_name, &fields.last_name),
      email: fields.email,
      first_name: fields.first_name,
      last_name: fields.last_name,
    };

    self
      .cache
      .with(|cache| reconcile::apply_create(cache, user.clone()));
    tracing::info!(
      id = user.id,
      created_at = created.created_at.as_deref().unwrap_or("-"),
      "user created"
    );

    Ok(user)
  }

  /// Update a user's fields everywhere they are cached.
  pub async fn update_user(&self, id: u64, fields: UserFields) -> Result<()> {
    validate_user_form(&fields.email, &fields.first_name, &fields.last_name)?;

    let updated = self
      .api
      .update_user(id, &fields)
      .await
      .inspect_err(|e| tracing::error!(id, error = %e, "update user failed"))?;

    let patched = self
      .cache
      .with(|cache| reconcile::apply_update(cache, id, &fields));
    tracing::info!(
      id,
      patched,
      updated_at = updated.updated_at.as_deref().unwrap_or("-"),
      "user updated"
    );

    Ok(())
  }

  /// Delete a user and close the gap in the cached pages.
  pub async fn delete_user(&self, id: u64) -> Result<()> {
    self
      .api
      .delete_user(id)
      .await
      .inspect_err(|e| tracing::error!(id, error = %e, "delete user failed"))?;

    self.cache.with(|cache| reconcile::apply_delete(cache, id));
    tracing::info!(id, "user deleted");

    Ok(())
  }

  /// Mark all list pages stale; the next read goes to the network.
  pub fn refresh(&self) {
    let count = self.cache.with(UsersCache::invalidate_pages);
    tracing::debug!(count, "invalidated user pages");
  }

  /// Inspect the cache directly.
  pub fn with_cache<R>(&self, f: impl FnOnce(&UsersCache) -> R) -> R {
    self.cache.with(|cache| f(cache))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::fake::FakeUsersApi;
  use crate::cache::CacheSource;
  use crate::error::Error;

  fn client(total: u64) -> (CachedUsersClient<FakeUsersApi>, Arc<FakeUsersApi>) {
    let api = Arc::new(FakeUsersApi::with_users(total));
    (
      CachedUsersClient::new(Arc::clone(&api), Duration::minutes(5)),
      api,
    )
  }

  fn fields(first: &str) -> UserFields {
    UserFields {
      email: format!("{}@reqres.in", first.to_lowercase()),
      first_name: first.to_string(),
      last_name: "Tester".to_string(),
    }
  }

  fn ids(page: &UsersPage) -> Vec<u64> {
    page.data.iter().map(|u| u.id).collect()
  }

  #[test]
  fn test_avatar_url() {
    assert_eq!(
      avatar_url("Ada", "Lovelace"),
      "https://ui-avatars.com/api/?name=Ada+Lovelace&background=random&color=fff&size=256"
    );
  }

  #[tokio::test]
  async fn test_list_users_is_cached() {
    let (client, api) = client(12);
    let first = client.list_users(1).await.unwrap();
    assert_eq!(first.source, CacheSource::Network);
    let second = client.list_users(1).await.unwrap();
    assert_eq!(second.source, CacheSource::CacheFresh);
    assert_eq!(second.data, first.data);
    assert_eq!(api.list_calls(), 1);
  }

  #[tokio::test]
  async fn test_create_shows_user_on_first_page() {
    let (client, _api) = client(12);
    client.list_users(1).await.unwrap();
    client.list_users(2).await.unwrap();

    let user = client.create_user(fields("Ada")).await.unwrap();
    assert_eq!(user.first_name, "Ada");
    assert!(user.avatar.contains("name=Ada+Tester"));

    let page1 = client.list_users(1).await.unwrap();
    assert!(page1.optimistic);
    assert_eq!(page1.data.total, 13);
    assert_eq!(page1.data.total_pages, 3);
    assert_eq!(ids(&page1.data), vec![user.id, 1, 2, 3, 4, 5]);

    let page2 = client.list_users(2).await.unwrap();
    assert_eq!(ids(&page2.data), vec![6, 7, 8, 9, 10, 11]);

    let single = client.get_user(user.id).await.unwrap();
    assert_eq!(single.source, CacheSource::CacheFresh);
    assert!(single.optimistic);
  }

  #[tokio::test]
  async fn test_failed_create_leaves_cache_untouched() {
    let (client, api) = client(12);
    let before = client.list_users(1).await.unwrap().data;

    api.set_failing(true);
    let err = client.create_user(fields("Ada")).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to create user");

    let after = client.with_cache(|c| c.page(1).cloned()).unwrap();
    assert_eq!(after, before);
    assert!(!client.with_cache(|c| c.is_page_optimistic(1)));
  }

  #[tokio::test]
  async fn test_invalid_form_never_reaches_remote() {
    let (client, api) = client(12);
    client.list_users(1).await.unwrap();
    // A remote call would fail loudly; validation must stop first
    api.set_failing(true);

    let err = client
      .create_user(UserFields {
        email: "nope".to_string(),
        first_name: String::new(),
        last_name: "X".to_string(),
      })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(client.with_cache(|c| c.page(1).unwrap().total), 12);
  }

  #[tokio::test]
  async fn test_update_patches_cached_pages() {
    let (client, _api) = client(12);
    client.list_users(2).await.unwrap();

    client.update_user(8, fields("Renamed")).await.unwrap();

    let page2 = client.list_users(2).await.unwrap();
    assert_eq!(page2.data.data[1].first_name, "Renamed");
    assert_eq!(page2.data.total, 12);
    assert_eq!(ids(&page2.data), vec![7, 8, 9, 10, 11, 12]);
  }

  #[tokio::test]
  async fn test_delete_shrinks_pages() {
    let (client, _api) = client(7);
    client.list_users(1).await.unwrap();
    client.list_users(2).await.unwrap();

    client.delete_user(7).await.unwrap();

    let page1 = client.with_cache(|c| c.page(1).cloned()).unwrap();
    assert_eq!(page1.total, 6);
    assert_eq!(page1.total_pages, 1);
    assert!(client.with_cache(|c| c.page(2).is_none()));
  }

  #[tokio::test]
  async fn test_failed_delete_leaves_cache_untouched() {
    let (client, api) = client(7);
    client.list_users(1).await.unwrap();
    client.list_users(2).await.unwrap();

    api.set_failing(true);
    assert!(client.delete_user(7).await.is_err());
    assert_eq!(client.with_cache(|c| c.cached_pages()), vec![1, 2]);
    assert_eq!(client.with_cache(|c| c.page(2).unwrap().total), 7);
  }

  #[tokio::test]
  async fn test_create_survives_aged_page() {
    let api = Arc::new(FakeUsersApi::with_users(12));
    let client = CachedUsersClient::new(Arc::clone(&api), Duration::milliseconds(100));
    client.list_users(1).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;

    let user = client.create_user(fields("Ada")).await.unwrap();

    let page1 = client.list_users(1).await.unwrap();
    assert_eq!(page1.source, CacheSource::CacheFresh);
    assert!(page1.optimistic);
    assert_eq!(page1.data.total, 13);
    assert_eq!(ids(&page1.data), vec![user.id, 1, 2, 3, 4, 5]);
    assert_eq!(api.list_calls(), 1);
  }

  #[tokio::test]
  async fn test_create_survives_invalidated_page() {
    let (client, api) = client(12);
    client.list_users(1).await.unwrap();

    // Refresh while the remote is down leaves the page invalidated
    client.refresh();
    api.set_failing(true);
    let offline = client.list_users(1).await.unwrap();
    assert_eq!(offline.source, CacheSource::Offline);
    api.set_failing(false);

    let user = client.create_user(fields("Ada")).await.unwrap();

    let page1 = client.list_users(1).await.unwrap();
    assert_eq!(page1.source, CacheSource::CacheFresh);
    assert_eq!(page1.data.total, 13);
    assert_eq!(page1.data.data[0].id, user.id);
    assert_eq!(api.list_calls(), 2);
  }

  #[tokio::test]
  async fn test_update_survives_aged_page() {
    let api = Arc::new(FakeUsersApi::with_users(12));
    let client = CachedUsersClient::new(Arc::clone(&api), Duration::milliseconds(100));
    client.list_users(2).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;

    client.update_user(8, fields("Renamed")).await.unwrap();

    let page2 = client.list_users(2).await.unwrap();
    assert!(page2.optimistic);
    assert_eq!(page2.data.data[1].first_name, "Renamed");
  }

  #[tokio::test]
  async fn test_refresh_replaces_optimistic_data() {
    let (client, api) = client(12);
    client.list_users(1).await.unwrap();
    client.create_user(fields("Ada")).await.unwrap();

    client.refresh();
    let page1 = client.list_users(1).await.unwrap();
    assert_eq!(page1.source, CacheSource::Network);
    assert!(!page1.optimistic);
    // The mock store never kept the new user
    assert_eq!(page1.data.total, 12);
    assert_eq!(api.list_calls(), 2);
  }
}
