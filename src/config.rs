use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_API_URL: &str = "https://reqres.in/api";
const DEFAULT_API_KEY: &str = "reqres-free-v1";
const DEFAULT_STALE_SECS: u64 = 5 * 60;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_api_url")]
  pub url: String,
  /// Static key sent as `x-api-key` on every request
  #[serde(default = "default_api_key")]
  pub api_key: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: default_api_url(),
      api_key: default_api_key(),
    }
  }
}

fn default_api_url() -> String {
  DEFAULT_API_URL.to_string()
}

fn default_api_key() -> String {
  DEFAULT_API_KEY.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Seconds before a cached page is refetched
  #[serde(default = "default_stale_secs")]
  pub stale_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_secs: DEFAULT_STALE_SECS,
    }
  }
}

fn default_stale_secs() -> u64 {
  DEFAULT_STALE_SECS
}

impl CacheConfig {
  /// Saturates at the largest representable duration.
  pub fn stale_time(&self) -> chrono::TimeDelta {
    i64::try_from(self.stale_secs)
      .ok()
      .and_then(chrono::TimeDelta::try_seconds)
      .unwrap_or(chrono::TimeDelta::MAX)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./u9s.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/u9s/config.yaml
  ///
  /// Without any file the built-in defaults point at the public ReqRes API.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => {
        tracing::debug!("no config file found, using defaults");
        Config::default()
      }
    };
    config.apply_env(|name| std::env::var(name).ok());
    config.validate()?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("u9s.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("u9s").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Environment overrides: U9S_API_URL and U9S_API_KEY.
  fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
    if let Some(url) = var("U9S_API_URL") {
      self.api.url = url;
    }
    if let Some(key) = var("U9S_API_KEY") {
      self.api.api_key = key;
    }
  }

  fn validate(&self) -> Result<()> {
    url::Url::parse(&self.api.url).map_err(|e| eyre!("Invalid api.url {}: {}", self.api.url, e))?;
    Ok(())
  }

  /// Host part of the API URL, for the header.
  pub fn api_host(&self) -> String {
    url::Url::parse(&self.api.url)
      .ok()
      .and_then(|u| u.host_str().map(String::from))
      .unwrap_or_else(|| self.api.url.clone())
  }
}
