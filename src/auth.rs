//! Sign-in, sign-up and sign-out on top of the session store.

use std::sync::Arc;

use crate::api::types::{Credentials, Profile};
use crate::api::UsersApi;
use crate::error::Result;
use crate::session::{Session, SessionStore};
use crate::validation::{validate_sign_in, validate_sign_up};

pub struct Auth<A> {
  api: Arc<A>,
  session: Arc<SessionStore>,
}

impl<A> Clone for Auth<A> {
  fn clone(&self) -> Self {
    Self {
      api: Arc::clone(&self.api),
      session: Arc::clone(&self.session),
    }
  }
}

impl<A: UsersApi> Auth<A> {
  pub fn new(api: Arc<A>, session: Arc<SessionStore>) -> Self {
    Self { api, session }
  }

  pub fn current(&self) -> Result<Option<Session>> {
    self.session.current()
  }

  pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
    validate_sign_in(email, password)?;
    let credentials = Credentials {
      email: email.trim().to_string(),
      password: password.to_string(),
    };

    let response = self
      .api
      .login(&credentials)
      .await
      .inspect_err(|e| tracing::error!(error = %e, "sign in failed"))?;

    self.establish(credentials.email, response.token).await
  }

  pub async fn sign_up(&self, email: &str, password: &str, confirm: &str) -> Result<Session> {
    validate_sign_up(email, password, confirm)?;
    let credentials = Credentials {
      email: email.trim().to_string(),
      password: password.to_string(),
    };

    let response = self
      .api
      .register(&credentials)
      .await
      .inspect_err(|e| tracing::error!(error = %e, "sign up failed"))?;
    tracing::debug!(id = ?response.id, "registered");

    self.establish(credentials.email, response.token).await
  }

  /// Persist the token and email, then best-effort fetch the profile.
  async fn establish(&self, email: String, token: String) -> Result<Session> {
    self.session.save_token(&token)?;
    self.session.save_email(&email)?;

    let profile = self.api.find_user_by_email(&email).await.map(|user| Profile {
      first_name: user.first_name,
      last_name: user.last_name,
    });
    if let Some(profile) = &profile {
      self.session.save_profile(profile)?;
    } else {
      tracing::debug!(email, "no profile found for signed-in user");
    }

    tracing::info!(email, "signed in");
    Ok(Session {
      token,
      email: Some(email),
      profile,
    })
  }

  pub fn sign_out(&self) -> Result<()> {
    self.session.clear()?;
    tracing::info!("signed out");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::fake::{FakeUsersApi, FAKE_TOKEN};
  use crate::error::Error;
  use crate::validation::Field;

  fn auth(total: u64) -> (Auth<FakeUsersApi>, Arc<FakeUsersApi>, Arc<SessionStore>) {
    let api = Arc::new(FakeUsersApi::with_users(total));
    let session = Arc::new(SessionStore::open_in_memory().unwrap());
    (
      Auth::new(Arc::clone(&api), Arc::clone(&session)),
      api,
      session,
    )
  }

  #[tokio::test]
  async fn test_sign_in_stores_session_and_profile() {
    let (auth, _api, store) = auth(12);
    let session = auth.sign_in("user4@reqres.in", "cityslicka").await.unwrap();

    assert_eq!(session.token, FAKE_TOKEN);
    assert_eq!(session.display_name(), "First4 Last4");
    assert_eq!(store.current().unwrap(), Some(session));
  }

  #[tokio::test]
  async fn test_sign_in_without_profile() {
    // Only pages 1 and 2 are scanned
    let (auth, _api, store) = auth(18);
    let session = auth.sign_in("user15@reqres.in", "secret").await.unwrap();
    assert!(session.profile.is_none());
    assert_eq!(store.email().unwrap().as_deref(), Some("user15@reqres.in"));
  }

  #[tokio::test]
  async fn test_sign_in_remote_failure_keeps_signed_out() {
    let (auth, _api, store) = auth(12);
    let err = auth.sign_in("stranger@reqres.in", "secret").await.unwrap_err();
    assert_eq!(err.to_string(), "user not found");
    assert!(store.current().unwrap().is_none());
  }

  #[tokio::test]
  async fn test_sign_up_validates_before_calling_remote() {
    let (auth, api, _store) = auth(12);
    api.set_failing(true);

    let err = auth
      .sign_up("user4@reqres.in", "pistol", "pist0l")
      .await
      .unwrap_err();
    let Error::Validation(failure) = &err else {
      panic!("expected validation failure, got {:?}", err);
    };
    assert_eq!(
      failure.message_for(Field::ConfirmPassword),
      Some("Passwords don't match")
    );
  }

  #[tokio::test]
  async fn test_sign_up_then_sign_out() {
    let (auth, _api, store) = auth(12);
    auth.sign_up("user4@reqres.in", "pistol", "pistol").await.unwrap();
    assert!(auth.current().unwrap().is_some());

    auth.sign_out().unwrap();
    assert!(store.current().unwrap().is_none());
  }
}
