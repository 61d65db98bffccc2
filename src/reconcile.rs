//! Patches the user cache right after a successful mutation.
//!
//! The remote store acknowledges writes but never persists them, so a refetch
//! would undo every change. Instead each mutation rewrites the cached pages
//! the way the server would have, as far as the cache can tell:
//!
//! - Data is only ever derived from cached pages. A page that is not cached
//!   is never fabricated.
//! - When users would have to cross an uncached page to reach a cached one,
//!   the cached page downstream of that gap is dropped so it gets fetched.
//! - Every touched entry is marked optimistic.
//!
//! Callers run these only after the remote call succeeded.

use crate::api::cache::{UsersCache, UsersQueryKey};
use crate::api::types::{total_pages_for, User, UserFields, PAGE_SIZE};

fn page_key(page: u32) -> UsersQueryKey {
  UsersQueryKey::Users { page }
}

/// Total user count as currently cached. Pages fetched together agree; page
/// 1 wins if they don't.
fn cached_total(cache: &UsersCache, pages: &[u32]) -> Option<u64> {
  cache
    .page(1)
    .or_else(|| pages.first().and_then(|p| cache.page(*p)))
    .map(|page| page.total)
}

/// Write `total` and the derived `total_pages` into every cached page.
fn set_totals(cache: &mut UsersCache, pages: &[u32], total: u64) {
  let total_pages = total_pages_for(total);
  for page in pages {
    cache.pages.update(&page_key(*page), |p| {
      p.total = total;
      p.total_pages = total_pages;
    });
  }
}

/// Prepend a freshly created user to page 1 and push the overflow down.
///
/// The user that falls off the end of page 1 moves to the head of page 2,
/// page 2's overflow to page 3, and so on while the next page is cached. If
/// an overflow would land on a page that is not cached, the cascade stops;
/// cached pages past that point are dropped.
pub fn apply_create(cache: &mut UsersCache, user: User) {
  let pages = cache.cached_pages();

  cache
    .users
    .set_optimistic(UsersQueryKey::User { id: user.id }, user.clone());

  let Some(old_total) = cached_total(cache, &pages) else {
    tracing::debug!(id = user.id, "no cached pages, nothing to reconcile");
    return;
  };

  let mut carry = Some(user);
  let mut page = 1u32;
  let mut gap = None;

  while let Some(incoming) = carry.take() {
    let key = page_key(page);
    if !cache.pages.contains(&key) {
      gap = Some(page);
      break;
    }

    cache.pages.update(&key, |p| {
      p.data.insert(0, incoming);
      if p.data.len() > PAGE_SIZE {
        carry = p.data.split_off(PAGE_SIZE).into_iter().next();
      }
    });
    page += 1;
  }

  if let Some(gap) = gap {
    let dropped = cache.pages.remove_where(|key| match key {
      UsersQueryKey::Users { page } => *page > gap,
      UsersQueryKey::User { .. } => false,
    });
    if dropped > 0 {
      tracing::debug!(gap, dropped, "create cascade hit an uncached page");
    }
  }

  let remaining = cache.cached_pages();
  set_totals(cache, &remaining, old_total + 1);
}

/// Replace the mutable fields of user `id` wherever it is cached.
///
/// Ordering and totals never change. Returns whether any entry matched.
pub fn apply_update(cache: &mut UsersCache, id: u64, fields: &UserFields) -> bool {
  let mut found = false;

  for page in cache.cached_pages() {
    let holds_user = cache
      .page(page)
      .is_some_and(|p| p.data.iter().any(|u| u.id == id));
    if !holds_user {
      continue;
    }

    cache.pages.update(&page_key(page), |p| {
      for user in p.data.iter_mut().filter(|u| u.id == id) {
        user.apply_fields(fields);
      }
    });
    found = true;
  }

  found |= cache
    .users
    .update(&UsersQueryKey::User { id }, |user| user.apply_fields(fields));

  found
}

/// Split ascending page numbers into runs of consecutive pages.
fn contiguous_runs(pages: &[u32]) -> Vec<Vec<u32>> {
  let mut runs: Vec<Vec<u32>> = Vec::new();
  for &page in pages {
    match runs.last_mut() {
      Some(run) if run.last().is_some_and(|last| last + 1 == page) => run.push(page),
      _ => runs.push(vec![page]),
    }
  }
  runs
}

/// Drop user `id` and close the hole it leaves.
///
/// Within the run of consecutive cached pages holding the user, everyone
/// after it shifts one slot forward across page boundaries. The last page of
/// that run is left one short when the page after it is not cached. Cached
/// pages past an uncached gap are dropped, as are pages beyond the new
/// `total_pages`. Page 1 always stays.
pub fn apply_delete(cache: &mut UsersCache, id: u64) {
  cache.users.remove(&UsersQueryKey::User { id });

  let pages = cache.cached_pages();
  let Some(old_total) = cached_total(cache, &pages) else {
    return;
  };
  let new_total = old_total.saturating_sub(1);
  let new_total_pages = total_pages_for(new_total);

  let mut shifted_run_end = None;
  for run in contiguous_runs(&pages) {
    let mut users: Vec<User> = run
      .iter()
      .filter_map(|p| cache.page(*p))
      .flat_map(|p| p.data.iter().cloned())
      .collect();

    let before = users.len();
    users.retain(|u| u.id != id);
    if users.len() == before {
      continue;
    }

    let mut chunks = users.chunks(PAGE_SIZE);
    for page in &run {
      let chunk = chunks.next().map(<[User]>::to_vec).unwrap_or_default();
      cache.pages.update(&page_key(*page), |p| p.data = chunk);
    }
    shifted_run_end = run.last().copied();
    break;
  }

  let last_kept = new_total_pages.max(1);
  cache.pages.remove_where(|key| match key {
    UsersQueryKey::Users { page } => {
      *page > last_kept || shifted_run_end.is_some_and(|end| *page > end)
    }
    UsersQueryKey::User { .. } => false,
  });

  let remaining = cache.cached_pages();
  set_totals(cache, &remaining, new_total);
}
