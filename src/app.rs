use crate::api::cached_client::CachedUsersClient;
use crate::api::UsersApi;
use crate::auth::Auth;
use crate::event::{Event, EventHandler};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{SignInView, UserListView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;

/// Services every view works against
pub struct AppContext<A> {
  pub users: CachedUsersClient<A>,
  pub auth: Auth<A>,
}

impl<A> Clone for AppContext<A> {
  fn clone(&self) -> Self {
    Self {
      users: self.users.clone(),
      auth: self.auth.clone(),
    }
  }
}

/// Main application state
pub struct App<A> {
  ctx: AppContext<A>,
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,
  /// Header title, the API host unless configured
  title: String,
  /// Name of the signed-in user, refreshed on navigation
  user_label: Option<String>,
  should_quit: bool,
}

impl<A: UsersApi + 'static> App<A> {
  /// Start on the user list when a session survives from a previous run,
  /// otherwise on the sign-in screen.
  pub fn new(ctx: AppContext<A>, title: String, initial_page: u32) -> Result<Self> {
    let session = ctx.auth.current()?;
    let root: Box<dyn View> = match &session {
      Some(s) => {
        tracing::info!(user = %s.display_name(), "resuming session");
        Box::new(UserListView::new(ctx.clone(), initial_page))
      }
      None => Box::new(SignInView::new(ctx.clone(), initial_page)),
    };

    Ok(Self {
      ctx,
      view_stack: vec![root],
      title,
      user_label: session.map(|s| s.display_name()),
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let result = self.event_loop().await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(Duration::from_millis(100));

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {
        let action = match self.view_stack.last_mut() {
          Some(view) => view.tick(),
          None => ViewAction::None,
        };
        self.apply(action);
      }
      Event::Resize => {}
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::Quit,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    let navigated = !matches!(action, ViewAction::None);
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        tracing::debug!(view = %view.breadcrumb_label(), "push view");
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
          if let Some(view) = self.view_stack.last_mut() {
            view.on_resume();
          }
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Replace(view) => {
        tracing::debug!(view = %view.breadcrumb_label(), "replace view");
        self.view_stack.pop();
        self.view_stack.push(view);
      }
      ViewAction::Quit => self.should_quit = true,
    }

    if navigated {
      self.refresh_user_label();
    }
  }

  fn refresh_user_label(&mut self) {
    self.user_label = match self.ctx.auth.current() {
      Ok(session) => session.map(|s| s.display_name()),
      Err(e) => {
        tracing::warn!(error = %e, "could not read session");
        None
      }
    };
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Main content
        Constraint::Length(1), // Footer
      ])
      .split(frame.area());

    let breadcrumb = self.breadcrumb();
    let Some(view) = self.view_stack.last_mut() else {
      return;
    };

    draw_header(
      frame,
      chunks[0],
      &self.title,
      self.user_label.as_deref(),
      &view.shortcuts(),
    );
    view.render(frame, chunks[1]);
    draw_footer(frame, chunks[2], &breadcrumb, view.status());
  }

  fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }
}
