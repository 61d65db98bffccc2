pub mod api_types;
pub mod cache;
pub mod cached_client;
pub mod client;
#[cfg(test)]
pub mod fake;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::{AuthResponse, CreatedUser, Credentials, UpdatedUser, User, UserFields, UsersPage};

/// Pages scanned when looking a user up by email.
const EMAIL_LOOKUP_PAGES: u32 = 2;

/// The remote user store.
///
/// Writes are acknowledged but not persisted: a create always returns a new
/// id, and later reads still show the original dataset.
#[async_trait]
pub trait UsersApi: Send + Sync {
  async fn list_users(&self, page: u32) -> Result<UsersPage>;

  async fn get_user(&self, id: u64) -> Result<User>;

  async fn create_user(&self, fields: &UserFields) -> Result<CreatedUser>;

  async fn update_user(&self, id: u64, fields: &UserFields) -> Result<UpdatedUser>;

  async fn delete_user(&self, id: u64) -> Result<()>;

  async fn register(&self, credentials: &Credentials) -> Result<AuthResponse>;

  async fn login(&self, credentials: &Credentials) -> Result<AuthResponse>;

  /// Scan the first pages for an exact email match. Lookup failures are
  /// logged and read as "not found".
  async fn find_user_by_email(&self, email: &str) -> Option<User> {
    for page in 1..=EMAIL_LOOKUP_PAGES {
      match self.list_users(page).await {
        Ok(users) => {
          if let Some(user) = users.data.into_iter().find(|u| u.email == email) {
            return Some(user);
          }
        }
        Err(e) => {
          tracing::warn!(email, error = %e, "failed to look up user by email");
          return None;
        }
      }
    }
    None
  }
}
