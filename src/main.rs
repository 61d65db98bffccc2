mod api;
mod app;
mod auth;
mod cache;
mod config;
mod error;
mod event;
mod logging;
mod pagination;
mod query;
mod reconcile;
mod session;
mod ui;
mod validation;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::cached_client::CachedUsersClient;
use crate::api::client::ReqresClient;
use crate::app::{App, AppContext};
use crate::auth::Auth;
use crate::session::SessionStore;

#[derive(Parser, Debug)]
#[command(name = "u9s")]
#[command(about = "A terminal UI for managing users on a ReqRes-style API, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./u9s.yaml, then $XDG_CONFIG_HOME/u9s/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Page of the user list to open on
  #[arg(short, long, default_value_t = 1)]
  page: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init()?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  let title = config.title.clone().unwrap_or_else(|| config.api_host());

  let session = Arc::new(SessionStore::open()?);
  let api = Arc::new(ReqresClient::new(&config.api, Arc::clone(&session))?);
  let ctx = AppContext {
    users: CachedUsersClient::new(Arc::clone(&api), config.cache.stale_time()),
    auth: Auth::new(api, session),
  };

  tracing::info!(url = %config.api.url, page = args.page, "starting");

  // Initialize and run the app
  let mut app = App::new(ctx, title, args.page)?;
  app.run().await?;

  Ok(())
}
