//! Persisted sign-in state: auth token, email and profile.
//!
//! Values live in a small SQLite table and expire one week after they were
//! written. An expired value reads as absent.

use chrono::{DateTime, Duration, Utc};
use color_eyre::eyre::eyre;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::api::types::Profile;
use crate::error::Result;

const TOKEN: &str = "auth_token";
const EMAIL: &str = "user_email";
const PROFILE: &str = "user_profile";

/// How long a stored value stays valid.
pub fn session_ttl() -> Duration {
  Duration::days(7)
}

const SESSION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS session (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    expires_at TEXT NOT NULL
);
"#;

/// Snapshot of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub token: String,
  pub email: Option<String>,
  pub profile: Option<Profile>,
}

impl Session {
  /// Name to greet the user with, falling back to the email.
  pub fn display_name(&self) -> String {
    match (&self.profile, &self.email) {
      (Some(p), _) => format!("{} {}", p.first_name, p.last_name),
      (None, Some(email)) => email.clone(),
      (None, None) => "signed in".to_string(),
    }
  }
}

/// SQLite-backed session values.
pub struct SessionStore {
  conn: Mutex<Connection>,
}

impl SessionStore {
  /// Open the store at the default location.
  pub fn open() -> color_eyre::Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create session directory: {}", e))?;
    }

    Self::open_at(&path)
      .map_err(|e| eyre!("Failed to open session store at {}: {}", path.display(), e))
  }

  /// Get the default database path.
  fn default_path() -> color_eyre::Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("u9s").join("session.db"))
  }

  pub fn open_at(path: &Path) -> Result<Self> {
    Self::with_connection(Connection::open(path)?)
  }

  pub fn open_in_memory() -> Result<Self> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn.execute_batch(SESSION_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn set(&self, name: &str, value: &str) -> Result<()> {
    self.set_until(name, value, Utc::now() + session_ttl())
  }

  fn set_until(&self, name: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()> {
    let conn = self.conn.lock();
    conn.execute(
      "INSERT OR REPLACE INTO session (name, value, expires_at) VALUES (?, ?, ?)",
      params![name, value, expires_at.to_rfc3339()],
    )?;
    Ok(())
  }

  fn get(&self, name: &str) -> Result<Option<String>> {
    let conn = self.conn.lock();
    let row: Option<(String, String)> = conn
      .query_row(
        "SELECT value, expires_at FROM session WHERE name = ?",
        params![name],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()?;

    let Some((value, expires_at)) = row else {
      return Ok(None);
    };

    let expired = DateTime::parse_from_rfc3339(&expires_at)
      .map(|t| t.with_timezone(&Utc) <= Utc::now())
      .unwrap_or(true);
    if expired {
      tracing::debug!(name, "session value expired");
      conn.execute("DELETE FROM session WHERE name = ?", params![name])?;
      return Ok(None);
    }

    Ok(Some(value))
  }

  pub fn save_token(&self, token: &str) -> Result<()> {
    self.set(TOKEN, token)
  }

  pub fn token(&self) -> Result<Option<String>> {
    self.get(TOKEN)
  }

  pub fn save_email(&self, email: &str) -> Result<()> {
    self.set(EMAIL, email)
  }

  pub fn email(&self) -> Result<Option<String>> {
    self.get(EMAIL)
  }

  pub fn save_profile(&self, profile: &Profile) -> Result<()> {
    self.set(PROFILE, &serde_json::to_string(profile)?)
  }

  /// A profile that fails to parse reads as absent.
  pub fn profile(&self) -> Result<Option<Profile>> {
    Ok(self.get(PROFILE)?.and_then(|raw| {
      serde_json::from_str(&raw)
        .map_err(|e| tracing::warn!(error = %e, "discarding unreadable profile"))
        .ok()
    }))
  }

  /// The current session, if a token is stored.
  pub fn current(&self) -> Result<Option<Session>> {
    let Some(token) = self.token()? else {
      return Ok(None);
    };
    Ok(Some(Session {
      token,
      email: self.email()?,
      profile: self.profile()?,
    }))
  }

  /// Forget everything (sign out).
  pub fn clear(&self) -> Result<()> {
    let conn = self.conn.lock();
    conn.execute(
      "DELETE FROM session WHERE name IN (?, ?, ?)",
      params![TOKEN, EMAIL, PROFILE],
    )?;
    Ok(())
  }
}
