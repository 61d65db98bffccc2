//! Current-page state for the user list.

/// Tracks which page is shown and keeps it inside the known page range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
  current_page: u32,
  total_pages: Option<u32>,
}

impl Default for Pagination {
  fn default() -> Self {
    Self::new(1)
  }
}

impl Pagination {
  pub fn new(initial_page: u32) -> Self {
    Self {
      current_page: initial_page.max(1),
      total_pages: None,
    }
  }

  pub fn current_page(&self) -> u32 {
    self.current_page
  }

  pub fn total_pages(&self) -> Option<u32> {
    self.total_pages
  }

  /// Jump to `page`, never below 1.
  pub fn go_to_page(&mut self, page: u32) {
    self.current_page = page.max(1);
  }

  /// Advance one page unless the last known page is showing.
  pub fn next_page(&mut self) -> bool {
    match self.total_pages {
      Some(total) if self.current_page >= total => false,
      _ => {
        self.go_to_page(self.current_page + 1);
        true
      }
    }
  }

  /// Go back one page, stopping at 1.
  pub fn prev_page(&mut self) -> bool {
    if self.current_page > 1 {
      self.go_to_page(self.current_page - 1);
      true
    } else {
      false
    }
  }

  /// Move to the last page when the current one no longer exists.
  /// Returns true if the page changed.
  pub fn adjust_if_needed(&mut self, total_pages: u32) -> bool {
    if total_pages > 0 && self.current_page > total_pages {
      self.go_to_page(total_pages);
      true
    } else {
      false
    }
  }

  /// Record the latest page count. Adjusts the current page whenever the
  /// count changes. Returns true if the current page moved.
  pub fn set_total_pages(&mut self, total_pages: u32) -> bool {
    if self.total_pages == Some(total_pages) {
      return false;
    }
    self.total_pages = Some(total_pages);
    self.adjust_if_needed(total_pages)
  }

  pub fn has_next(&self) -> bool {
    self
      .total_pages
      .map_or(true, |total| self.current_page < total)
  }

  pub fn has_prev(&self) -> bool {
    self.current_page > 1
  }
}
