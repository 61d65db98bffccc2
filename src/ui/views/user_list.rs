use crate::api::types::{total_pages_for, User, UsersPage};
use crate::api::UsersApi;
use crate::app::AppContext;
use crate::cache::{CacheResult, CacheSource};
use crate::pagination::Pagination;
use crate::query::{Mutation, Query, QueryState};
use crate::ui::components::{ConfirmPrompt, KeyResult};
use crate::ui::renderfns::{ensure_valid_selection, truncate};
use crate::ui::view::{ShortcutInfo, StatusMessage, View, ViewAction};
use crate::ui::views::{SignInView, UserFormView};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// One page of users with create, edit and delete
pub struct UserListView<A> {
  ctx: AppContext<A>,
  pagination: Pagination,
  query: Query<CacheResult<UsersPage>>,
  list_state: ListState,
  confirm: ConfirmPrompt,
  /// User awaiting delete confirmation
  pending_delete: Option<User>,
  delete: Mutation<()>,
  status: Option<StatusMessage>,
}

fn page_query<A: UsersApi + 'static>(
  ctx: &AppContext<A>,
  page: u32,
) -> Query<CacheResult<UsersPage>> {
  let users = ctx.users.clone();
  Query::new(move || {
    let users = users.clone();
    async move { users.list_users(page).await.map_err(|e| e.to_string()) }
  })
}

impl<A: UsersApi + 'static> UserListView<A> {
  pub fn new(ctx: AppContext<A>, initial_page: u32) -> Self {
    let pagination = Pagination::new(initial_page);
    let mut query = page_query(&ctx, pagination.current_page());
    query.fetch();

    Self {
      ctx,
      pagination,
      query,
      list_state: ListState::default().with_selected(Some(0)),
      confirm: ConfirmPrompt::new(),
      pending_delete: None,
      delete: Mutation::new(),
      status: None,
    }
  }

  fn page(&self) -> Option<&CacheResult<UsersPage>> {
    self.query.data()
  }

  fn users(&self) -> &[User] {
    self.page().map(|p| p.data.data.as_slice()).unwrap_or(&[])
  }

  fn selected_user(&self) -> Option<&User> {
    self.list_state.selected().and_then(|i| self.users().get(i))
  }

  /// Point the query at the current page and load it
  fn load_current_page(&mut self) {
    self.query = page_query(&self.ctx, self.pagination.current_page());
    self.query.fetch();
    self.list_state.select(Some(0));
  }

  fn title(&self) -> String {
    let page = self.pagination.current_page();
    let total = self
      .pagination
      .total_pages()
      .map(|t| t.to_string())
      .unwrap_or_else(|| "?".to_string());

    let mut title = format!(" Users page {}/{}", page, total);
    if let Some(result) = self.page() {
      title.push_str(&format!(" ({} total)", result.data.total));
      if result.optimistic {
        title.push_str(" [optimistic]");
      }
      let tag = match result.source {
        CacheSource::Offline => Some("offline"),
        CacheSource::CacheStale => Some("stale"),
        CacheSource::Network | CacheSource::CacheFresh => None,
      };
      if let Some(tag) = tag {
        match result.cached_at {
          Some(at) => title.push_str(&format!(
            " [{} since {}]",
            tag,
            at.with_timezone(&chrono::Local).format("%H:%M")
          )),
          None => title.push_str(&format!(" [{}]", tag)),
        }
      }
    }
    if self.query.is_loading() {
      title.push_str(" (loading...)");
    }
    title.push(' ');
    title
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.users().len();
    ensure_valid_selection(&mut self.list_state, len);

    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.query.is_loading() {
      let content = match self.query.state() {
        QueryState::Error(e) => format!("{}. Press 'r' to retry.", e),
        _ => "No users found.".to_string(),
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let email_width = (area.width as usize / 3).max(12);
    let items: Vec<ListItem> = self
      .users()
      .iter()
      .map(|user| {
        let line = Line::from(vec![
          Span::styled(format!("{:<6}", user.id), Style::default().fg(Color::Cyan)),
          Span::raw(" "),
          Span::styled(
            format!(
              "{:<width$}",
              truncate(&user.email, email_width),
              width = email_width
            ),
            Style::default().fg(Color::Yellow),
          ),
          Span::raw(" "),
          Span::raw(user.full_name()),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  // Key handling helpers for or_else chain pattern
  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.confirm.handle_key(key) {
      KeyResult::Handled => Some(ViewAction::None),
      KeyResult::Event(true) => {
        self.start_delete();
        Some(ViewAction::None)
      }
      KeyResult::Event(false) => {
        self.pending_delete = None;
        Some(ViewAction::None)
      }
      KeyResult::NotHandled => None,
    }
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
        Some(ViewAction::None)
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
        Some(ViewAction::None)
      }
      KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
        if self.pagination.next_page() {
          self.load_current_page();
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
        if self.pagination.prev_page() {
          self.load_current_page();
        }
        Some(ViewAction::None)
      }
      _ => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('a') => Some(ViewAction::Push(Box::new(UserFormView::create(
        self.ctx.clone(),
      )))),
      KeyCode::Char('e') | KeyCode::Enter => {
        let user = self.selected_user()?.clone();
        Some(ViewAction::Push(Box::new(UserFormView::edit(
          self.ctx.clone(),
          user,
        ))))
      }
      KeyCode::Char('d') => {
        if self.delete.is_pending() {
          return Some(ViewAction::None);
        }
        let user = self.selected_user()?.clone();
        self
          .confirm
          .open(format!("Delete {} ({})?", user.full_name(), user.email));
        self.pending_delete = Some(user);
        Some(ViewAction::None)
      }
      KeyCode::Char('r') => {
        self.ctx.users.refresh();
        self.query.refetch();
        self.status = None;
        Some(ViewAction::None)
      }
      KeyCode::Char('L') => match self.ctx.auth.sign_out() {
        Ok(()) => Some(ViewAction::Replace(Box::new(SignInView::new(
          self.ctx.clone(),
          1,
        )))),
        Err(e) => {
          self.status = Some(StatusMessage::Error(e.to_string()));
          Some(ViewAction::None)
        }
      },
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }

  fn start_delete(&mut self) {
    let Some(user) = self.pending_delete.take() else {
      return;
    };
    let users = self.ctx.users.clone();
    let id = user.id;
    self.delete.start(async move {
      users.delete_user(id).await.map_err(|e| e.to_string())
    });
    self.status = Some(StatusMessage::Info(format!("Deleting {}...", user.full_name())));
  }

  /// Move off a page the delete just emptied, otherwise re-read the
  /// reconciled cache.
  fn after_delete(&mut self) {
    let cached = self.ctx.users.with_cache(|c| {
      c.cached_pages()
        .first()
        .and_then(|p| c.page(*p))
        .map(|p| p.total_pages)
    });
    let shown = self
      .page()
      .map(|p| total_pages_for(p.data.total.saturating_sub(1)));

    if let Some(total_pages) = cached.or(shown) {
      if self.pagination.set_total_pages(total_pages) {
        self.load_current_page();
        return;
      }
    }
    self.query.refetch();
  }

  /// Feed the loaded page's total into pagination. Returns whether the
  /// current page moved.
  fn sync_pagination(&mut self) -> bool {
    let Some(total_pages) = self.page().map(|p| p.data.total_pages) else {
      return false;
    };
    self.pagination.set_total_pages(total_pages)
  }
}

impl<A: UsersApi + 'static> View for UserListView<A> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_overlays(key)
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Users".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    if self.query.poll() {
      if let Some(e) = self.query.error() {
        self.status = Some(StatusMessage::Error(e.to_string()));
      }
      let len = self.users().len();
      ensure_valid_selection(&mut self.list_state, len);
      if self.sync_pagination() {
        // The page we were on no longer exists
        self.load_current_page();
      }
    }

    if let Some(result) = self.delete.poll() {
      match result {
        Ok(()) => {
          self.status = Some(StatusMessage::Info("User deleted".to_string()));
          self.after_delete();
        }
        Err(e) => self.status = Some(StatusMessage::Error(e)),
      }
    }

    ViewAction::None
  }

  fn on_resume(&mut self) {
    // A form may have changed the cache underneath us
    self.query.refetch();
  }

  fn status(&self) -> Option<&StatusMessage> {
    self.status.as_ref()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = Vec::new();
    if self.pagination.has_next() {
      shortcuts.push(ShortcutInfo::new("n", "next").with_priority(10));
    }
    if self.pagination.has_prev() {
      shortcuts.push(ShortcutInfo::new("p", "prev").with_priority(11));
    }
    shortcuts.extend([
      ShortcutInfo::new("a", "add").with_priority(20),
      ShortcutInfo::new("e", "edit").with_priority(30),
      ShortcutInfo::new("d", "delete").with_priority(40),
      ShortcutInfo::new("r", "refresh").with_priority(50),
      ShortcutInfo::new("L", "sign out").with_priority(60),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]);
    shortcuts
  }
}
