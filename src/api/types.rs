use serde::{Deserialize, Serialize};

/// Users per page, as requested from and served by the remote store.
pub const PAGE_SIZE: usize = 6;

/// A user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: u64,
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub avatar: String,
}

impl User {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }

  /// Overwrite the mutable fields, keeping id and avatar
  pub fn apply_fields(&mut self, fields: &UserFields) {
    self.email = fields.email.clone();
    self.first_name = fields.first_name.clone();
    self.last_name = fields.last_name.clone();
  }
}

/// Mutable user fields, sent on create and update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFields {
  pub email: String,
  pub first_name: String,
  pub last_name: String,
}

impl From<&User> for UserFields {
  fn from(user: &User) -> Self {
    Self {
      email: user.email.clone(),
      first_name: user.first_name.clone(),
      last_name: user.last_name.clone(),
    }
  }
}

/// One fetch-sized slice of the user collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersPage {
  pub page: u32,
  #[serde(default = "default_per_page")]
  pub per_page: u32,
  pub total: u64,
  pub total_pages: u32,
  #[serde(default)]
  pub data: Vec<User>,
}

fn default_per_page() -> u32 {
  PAGE_SIZE as u32
}

/// Number of pages needed to hold `total` users
pub fn total_pages_for(total: u64) -> u32 {
  total.div_ceil(PAGE_SIZE as u64) as u32
}

/// Acknowledgement of a create; the store assigns a fresh id every time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedUser {
  pub id: u64,
  pub created_at: Option<String>,
}

/// Acknowledgement of an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedUser {
  pub updated_at: Option<String>,
}

/// Email/password pair for sign-in and sign-up
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
  pub email: String,
  pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
  pub id: Option<u64>,
  pub token: String,
}

/// Display name of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  #[serde(rename = "firstName")]
  pub first_name: String,
  #[serde(rename = "lastName")]
  pub last_name: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_total_pages_for() {
    assert_eq!(total_pages_for(0), 0);
    assert_eq!(total_pages_for(1), 1);
    assert_eq!(total_pages_for(6), 1);
    assert_eq!(total_pages_for(7), 2);
    assert_eq!(total_pages_for(12), 2);
    assert_eq!(total_pages_for(13), 3);
  }

  #[test]
  fn test_page_parses_reqres_body() {
    let body = r#"{
      "page": 2, "per_page": 6, "total": 12, "total_pages": 2,
      "data": [{"id": 7, "email": "michael.lawson@reqres.in", "first_name": "Michael",
                "last_name": "Lawson", "avatar": "https://reqres.in/img/faces/7-image.jpg"}],
      "support": {"url": "https://reqres.in", "text": "..."}
    }"#;
    let page: UsersPage = serde_json::from_str(body).unwrap();
    assert_eq!(page.page, 2);
    assert_eq!(page.data[0].full_name(), "Michael Lawson");
  }
}
