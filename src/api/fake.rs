//! In-memory stand-in for the remote store, used by tests.
//!
//! Behaves like the mock service: reads always return the fixed dataset,
//! writes are acknowledged and forgotten.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use super::types::{
  total_pages_for, AuthResponse, CreatedUser, Credentials, UpdatedUser, User, UserFields,
  UsersPage, PAGE_SIZE,
};
use super::UsersApi;
use crate::error::{Error, Result};

pub const FAKE_TOKEN: &str = "QpwL5tke4Pnpja7X4";

pub struct FakeUsersApi {
  users: Vec<User>,
  next_id: AtomicU64,
  failing: AtomicBool,
  list_calls: AtomicU32,
}

pub fn fake_user(id: u64) -> User {
  User {
    id,
    email: format!("user{}@reqres.in", id),
    first_name: format!("First{}", id),
    last_name: format!("Last{}", id),
    avatar: format!("https://reqres.in/img/faces/{}-image.jpg", id),
  }
}

impl FakeUsersApi {
  /// Dataset of `total` users with ids 1..=total.
  pub fn with_users(total: u64) -> Self {
    Self {
      users: (1..=total).map(fake_user).collect(),
      next_id: AtomicU64::new(500),
      failing: AtomicBool::new(false),
      list_calls: AtomicU32::new(0),
    }
  }

  /// Make every subsequent call fail with a 500.
  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  pub fn list_calls(&self) -> u32 {
    self.list_calls.load(Ordering::SeqCst)
  }

  fn check(&self, fallback: &str) -> Result<()> {
    if self.failing.load(Ordering::SeqCst) {
      Err(Error::remote(500, fallback))
    } else {
      Ok(())
    }
  }

  fn is_known(&self, email: &str) -> bool {
    self.users.iter().any(|u| u.email == email)
  }
}

#[async_trait]
impl UsersApi for FakeUsersApi {
  async fn list_users(&self, page: u32) -> Result<UsersPage> {
    self.list_calls.fetch_add(1, Ordering::SeqCst);
    self.check("Failed to fetch users")?;
    let total = self.users.len() as u64;
    let data = self
      .users
      .iter()
      .skip((page.saturating_sub(1) as usize) * PAGE_SIZE)
      .take(PAGE_SIZE)
      .cloned()
      .collect();
    Ok(UsersPage {
      page,
      per_page: PAGE_SIZE as u32,
      total,
      total_pages: total_pages_for(total),
      data,
    })
  }

  async fn get_user(&self, id: u64) -> Result<User> {
    self.check("Failed to fetch user")?;
    self
      .users
      .iter()
      .find(|u| u.id == id)
      .cloned()
      .ok_or_else(|| Error::remote(404, "Failed to fetch user"))
  }

  async fn create_user(&self, _fields: &UserFields) -> Result<CreatedUser> {
    self.check("Failed to create user")?;
    Ok(CreatedUser {
      id: self.next_id.fetch_add(1, Ordering::SeqCst),
      created_at: Some("2026-10-18T12:00:00.000Z".to_string()),
    })
  }

  async fn update_user(&self, _id: u64, _fields: &UserFields) -> Result<UpdatedUser> {
    self.check("Failed to update user")?;
    Ok(UpdatedUser {
      updated_at: Some("2026-10-18T12:00:00.000Z".to_string()),
    })
  }

  async fn delete_user(&self, _id: u64) -> Result<()> {
    self.check("Failed to delete user")
  }

  async fn register(&self, credentials: &Credentials) -> Result<AuthResponse> {
    self.check("Failed to sign up")?;
    if !self.is_known(&credentials.email) {
      return Err(Error::remote(
        400,
        "Note: Only defined users succeed registration",
      ));
    }
    Ok(AuthResponse {
      id: Some(4),
      token: FAKE_TOKEN.to_string(),
    })
  }

  async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
    self.check("Failed to sign in")?;
    if credentials.password.is_empty() {
      return Err(Error::remote(400, "Missing password"));
    }
    if !self.is_known(&credentials.email) {
      return Err(Error::remote(400, "user not found"));
    }
    Ok(AuthResponse {
      id: None,
      token: FAKE_TOKEN.to_string(),
    })
  }
}
