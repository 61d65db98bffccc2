//! Error types shared by the API, cache and auth layers.
//!
//! The application boundary (`main`, `app`, `config`) works with
//! `color_eyre::Result`; everything below it returns [`Error`] so callers can
//! tell a rejected form apart from a failed remote call.

use crate::validation::ValidationFailure;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The remote store answered with a non-2xx status.
  #[error("{message}")]
  RemoteCall { status: u16, message: String },

  /// Client-side field constraints rejected the input before any request.
  #[error(transparent)]
  Validation(#[from] ValidationFailure),

  #[error("Request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("Failed to decode response: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("Invalid URL: {0}")]
  Url(#[from] url::ParseError),

  #[error("Session store error: {0}")]
  Session(#[from] rusqlite::Error),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl Error {
  pub fn remote(status: u16, message: impl Into<String>) -> Self {
    Self::RemoteCall {
      status,
      message: message.into(),
    }
  }
}
