//! Serde-deserializable envelopes matching the remote store's responses.
//!
//! List pages and users deserialize straight into domain types; only the
//! mutation acknowledgements and error bodies need their own shapes.

use serde::{Deserialize, Deserializer};

use super::types::{CreatedUser, UpdatedUser, User};

/// `GET /users/{id}` wraps the user in `data`
#[derive(Debug, Deserialize)]
pub struct ApiUserResponse {
  pub data: User,
}

/// Body of a failed call, e.g. `{"error": "Missing password"}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
  pub error: Option<String>,
}

/// The store also echoes the submitted fields; only the id and stamp are kept.
#[derive(Debug, Deserialize)]
pub struct ApiCreatedUser {
  #[serde(deserialize_with = "deserialize_id")]
  pub id: u64,
  #[serde(rename = "createdAt")]
  pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiUpdatedUser {
  #[serde(rename = "updatedAt")]
  pub updated_at: Option<String>,
}

/// The mock store echoes ids as strings (`"id": "512"`) on create.
fn deserialize_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum IdRepr {
    Number(u64),
    Text(String),
  }

  match IdRepr::deserialize(deserializer)? {
    IdRepr::Number(id) => Ok(id),
    IdRepr::Text(s) => s
      .trim()
      .parse()
      .map_err(|_| serde::de::Error::custom(format!("invalid user id: {}", s))),
  }
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl From<ApiCreatedUser> for CreatedUser {
  fn from(api: ApiCreatedUser) -> Self {
    CreatedUser {
      id: api.id,
      created_at: api.created_at,
    }
  }
}

impl From<ApiUpdatedUser> for UpdatedUser {
  fn from(api: ApiUpdatedUser) -> Self {
    UpdatedUser {
      updated_at: api.updated_at,
    }
  }
}
