use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

use crate::api::api_types::{ApiCreatedUser, ApiErrorBody, ApiUpdatedUser, ApiUserResponse};
use crate::api::types::{
  AuthResponse, CreatedUser, Credentials, UpdatedUser, User, UserFields, UsersPage, PAGE_SIZE,
};
use crate::api::UsersApi;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::session::SessionStore;

const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for a ReqRes-style user store
#[derive(Clone)]
pub struct ReqresClient {
  http: reqwest::Client,
  base_url: Url,
  api_key: String,
  session: Arc<SessionStore>,
}

impl ReqresClient {
  pub fn new(config: &ApiConfig, session: Arc<SessionStore>) -> Result<Self> {
    let http = reqwest::Client::builder()
      .user_agent(concat!("u9s/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      http,
      base_url: normalize_base(&config.url)?,
      api_key: config.api_key.clone(),
      session,
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    Ok(self.base_url.join(path.trim_start_matches('/'))?)
  }

  /// Every request carries the API key, plus the bearer token once signed in.
  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    let builder = self
      .http
      .request(method, url)
      .header(API_KEY_HEADER, &self.api_key);

    match self.session.token() {
      Ok(Some(token)) => builder.bearer_auth(token),
      Ok(None) => builder,
      Err(e) => {
        tracing::warn!(error = %e, "could not read session token");
        builder
      }
    }
  }

  async fn send(&self, builder: RequestBuilder, fallback: &str) -> Result<Vec<u8>> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
      let err = error_from_body(status, &body, fallback);
      tracing::debug!(status = status.as_u16(), error = %err, "remote call failed");
      return Err(err);
    }

    Ok(body.to_vec())
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url, fallback: &str) -> Result<T> {
    let body = self.send(self.request(Method::GET, url), fallback).await?;
    Ok(serde_json::from_slice(&body)?)
  }

  async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
    &self,
    method: Method,
    url: Url,
    payload: &B,
    fallback: &str,
  ) -> Result<T> {
    let builder = self.request(method, url).json(payload);
    let body = self.send(builder, fallback).await?;
    Ok(serde_json::from_slice(&body)?)
  }
}

/// `Url::join` replaces the last path segment unless the base ends in '/'.
fn normalize_base(raw: &str) -> Result<Url> {
  let trimmed = raw.trim();
  if trimmed.ends_with('/') {
    Ok(Url::parse(trimmed)?)
  } else {
    Ok(Url::parse(&format!("{}/", trimmed))?)
  }
}

/// Use the body's `error` message when there is one.
fn error_from_body(status: StatusCode, body: &[u8], fallback: &str) -> Error {
  let message = serde_json::from_slice::<ApiErrorBody>(body)
    .ok()
    .and_then(|b| b.error)
    .filter(|m| !m.trim().is_empty())
    .unwrap_or_else(|| fallback.to_string());
  Error::remote(status.as_u16(), message)
}

#[async_trait]
impl UsersApi for ReqresClient {
  async fn list_users(&self, page: u32) -> Result<UsersPage> {
    let mut url = self.endpoint("users")?;
    url
      .query_pairs_mut()
      .append_pair("page", &page.to_string())
      .append_pair("per_page", &PAGE_SIZE.to_string());

    self.get_json(url, "Failed to fetch users").await
  }

  async fn get_user(&self, id: u64) -> Result<User> {
    let url = self.endpoint(&format!("users/{}", id))?;
    let response: ApiUserResponse = self.get_json(url, "Failed to fetch user").await?;
    Ok(response.data)
  }

  async fn create_user(&self, fields: &UserFields) -> Result<CreatedUser> {
    let url = self.endpoint("users")?;
    let created: ApiCreatedUser = self
      .send_json(Method::POST, url, fields, "Failed to create user")
      .await?;
    Ok(created.into())
  }

  async fn update_user(&self, id: u64, fields: &UserFields) -> Result<UpdatedUser> {
    let url = self.endpoint(&format!("users/{}", id))?;
    let updated: ApiUpdatedUser = self
      .send_json(Method::PUT, url, fields, "Failed to update user")
      .await?;
    Ok(updated.into())
  }

  async fn delete_user(&self, id: u64) -> Result<()> {
    let url = self.endpoint(&format!("users/{}", id))?;
    self
      .send(self.request(Method::DELETE, url), "Failed to delete user")
      .await?;
    Ok(())
  }

  async fn register(&self, credentials: &Credentials) -> Result<AuthResponse> {
    let url = self.endpoint("register")?;
    self
      .send_json(Method::POST, url, credentials, "Failed to sign up")
      .await
  }

  async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
    let url = self.endpoint("login")?;
    self
      .send_json(Method::POST, url, credentials, "Failed to sign in")
      .await
  }
}
