//! Async handles polled from the UI tick.
//!
//! The event loop never awaits. Work runs on a spawned tokio task and the
//! result comes back through a oneshot channel that views poll on each tick.
//!
//! - `Query<T>`: a repeatable read with loading/success/error state.
//! - `Mutation<T>`: a single write whose outcome is handed over exactly once.
//!
//! ```ignore
//! let users = client.clone();
//! let mut query = Query::new(move || {
//!   let users = users.clone();
//!   async move { users.list_users(page).await.map_err(|e| e.to_string()) }
//! });
//! query.fetch();
//!
//! // on tick
//! if query.poll() {
//!   // state changed, next draw picks it up
//! }
//! ```

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// The state of a query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
  Idle,
  Loading,
  Success(T),
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

/// A running task and the channel its result arrives on.
struct InFlight<T> {
  rx: oneshot::Receiver<Result<T, String>>,
  handle: JoinHandle<()>,
}

impl<T: Send + 'static> InFlight<T> {
  fn spawn(future: BoxFuture<'static, Result<T, String>>) -> Self {
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
      // Receiver may be gone after a refetch
      let _ = tx.send(future.await);
    });
    Self { rx, handle }
  }

  /// `None` while still running.
  fn try_take(&mut self) -> Option<Result<T, String>> {
    match self.rx.try_recv() {
      Ok(result) => Some(result),
      Err(oneshot::error::TryRecvError::Empty) => None,
      Err(oneshot::error::TryRecvError::Closed) => Some(Err("Request was cancelled".to_string())),
    }
  }

  fn abort(self) {
    self.handle.abort();
  }
}

/// Repeatable async read.
///
/// Data from a previous success stays visible while a refetch is loading, so
/// a list does not blank out between pages of the same source.
pub struct Query<T> {
  state: QueryState<T>,
  previous: Option<T>,
  fetcher: FetcherFn<T>,
  in_flight: Option<InFlight<T>>,
}

impl<T: Send + 'static> Query<T> {
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      previous: None,
      fetcher: Box::new(move || fetcher().boxed()),
      in_flight: None,
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Current data, or the last successful data while reloading.
  pub fn data(&self) -> Option<&T> {
    self.state.data().or(self.previous.as_ref())
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Start fetching unless a fetch is already running.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Drop any running fetch and start over.
  pub fn refetch(&mut self) {
    if let Some(in_flight) = self.in_flight.take() {
      in_flight.abort();
    }
    self.start_fetch();
  }

  /// Returns `true` when the state changed.
  pub fn poll(&mut self) -> bool {
    let Some(in_flight) = self.in_flight.as_mut() else {
      return false;
    };
    let Some(result) = in_flight.try_take() else {
      return false;
    };

    self.in_flight = None;
    self.previous = None;
    self.state = match result {
      Ok(data) => QueryState::Success(data),
      Err(error) => QueryState::Error(error),
    };
    true
  }

  fn start_fetch(&mut self) {
    let old = std::mem::replace(&mut self.state, QueryState::Loading);
    if let QueryState::Success(data) = old {
      self.previous = Some(data);
    }
    self.in_flight = Some(InFlight::spawn((self.fetcher)()));
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("in_flight", &self.in_flight.is_some())
      .finish_non_exhaustive()
  }
}

/// One-shot async write.
pub struct Mutation<T> {
  in_flight: Option<InFlight<T>>,
}

impl<T> Default for Mutation<T> {
  fn default() -> Self {
    Self { in_flight: None }
  }
}

impl<T: Send + 'static> Mutation<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_pending(&self) -> bool {
    self.in_flight.is_some()
  }

  /// Ignored while a previous write is still pending.
  pub fn start<Fut>(&mut self, future: Fut) -> bool
  where
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    if self.is_pending() {
      return false;
    }
    self.in_flight = Some(InFlight::spawn(future.boxed()));
    true
  }

  /// The outcome, once, when the write finishes.
  pub fn poll(&mut self) -> Option<Result<T, String>> {
    let result = self.in_flight.as_mut()?.try_take()?;
    self.in_flight = None;
    Some(result)
  }
}
