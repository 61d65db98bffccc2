use crate::api::UsersApi;
use crate::app::AppContext;
use crate::query::Mutation;
use crate::session::Session;
use crate::ui::components::{Form, FormEvent, KeyResult, TextInput};
use crate::ui::renderfns::centered_rect;
use crate::ui::view::{ShortcutInfo, StatusMessage, View, ViewAction};
use crate::ui::views::UserListView;
use crate::validation::{validate_sign_in, validate_sign_up, Field};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
  SignIn,
  SignUp,
}

/// Sign-in screen; Ctrl-T switches to sign-up, which adds a confirmation field.
pub struct SignInView<A> {
  ctx: AppContext<A>,
  /// Page the user list opens on once signed in
  initial_page: u32,
  mode: Mode,
  form: Form,
  auth: Mutation<Session>,
  status: Option<StatusMessage>,
}

impl<A: UsersApi + 'static> SignInView<A> {
  pub fn new(ctx: AppContext<A>, initial_page: u32) -> Self {
    let form = Form::new()
      .with_field(Field::Email, TextInput::new())
      .with_field(Field::Password, TextInput::masked());

    Self {
      ctx,
      initial_page,
      mode: Mode::SignIn,
      form,
      auth: Mutation::new(),
      status: None,
    }
  }

  fn toggle_mode(&mut self) {
    self.mode = match self.mode {
      Mode::SignIn => {
        self.form = std::mem::take(&mut self.form)
          .with_field(Field::ConfirmPassword, TextInput::masked());
        Mode::SignUp
      }
      Mode::SignUp => {
        self.form.remove_field(Field::ConfirmPassword);
        Mode::SignIn
      }
    };
    self.form.clear_errors();
    self.status = None;
  }

  fn submit(&mut self) {
    if self.auth.is_pending() {
      return;
    }

    let email = self.form.value(Field::Email).trim().to_string();
    let password = self.form.value(Field::Password).to_string();
    let confirm = self.form.value(Field::ConfirmPassword).to_string();

    let checked = match self.mode {
      Mode::SignIn => validate_sign_in(&email, &password),
      Mode::SignUp => validate_sign_up(&email, &password, &confirm),
    };
    if let Err(failure) = checked {
      self.form.set_errors(&failure);
      return;
    }
    self.form.clear_errors();

    let auth = self.ctx.auth.clone();
    let mode = self.mode;
    self.auth.start(async move {
      let result = match mode {
        Mode::SignIn => auth.sign_in(&email, &password).await,
        Mode::SignUp => auth.sign_up(&email, &password, &confirm).await,
      };
      result.map_err(|e| e.to_string())
    });
    self.status = Some(StatusMessage::Info(match mode {
      Mode::SignIn => "Signing in...".to_string(),
      Mode::SignUp => "Signing up...".to_string(),
    }));
  }

  fn title(&self) -> &str {
    match self.mode {
      Mode::SignIn => "Sign in",
      Mode::SignUp => "Sign up",
    }
  }
}

impl<A: UsersApi + 'static> View for SignInView<A> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if key.code == KeyCode::Char('t') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.toggle_mode();
      return ViewAction::None;
    }

    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted) => {
        self.submit();
        ViewAction::None
      }
      KeyResult::Event(FormEvent::Cancelled) => ViewAction::Quit,
      KeyResult::Handled | KeyResult::NotHandled => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let form_area = centered_rect(area.width.min(64), self.form.height(), area);
    self
      .form
      .render(frame, form_area, self.title(), self.auth.is_pending());
  }

  fn breadcrumb_label(&self) -> String {
    self.title().to_string()
  }

  fn tick(&mut self) -> ViewAction {
    match self.auth.poll() {
      Some(Ok(session)) => {
        tracing::debug!(user = %session.display_name(), "opening user list");
        ViewAction::Replace(Box::new(UserListView::new(
          self.ctx.clone(),
          self.initial_page,
        )))
      }
      Some(Err(e)) => {
        self.status = Some(StatusMessage::Error(e));
        ViewAction::None
      }
      None => ViewAction::None,
    }
  }

  fn status(&self) -> Option<&StatusMessage> {
    self.status.as_ref()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let toggle = match self.mode {
      Mode::SignIn => "sign up",
      Mode::SignUp => "sign in",
    };
    vec![
      ShortcutInfo::new("tab", "next field").with_priority(10),
      ShortcutInfo::new("enter", "submit").with_priority(20),
      ShortcutInfo::new("ctrl-t", toggle).with_priority(30),
      ShortcutInfo::new("esc", "quit").with_priority(90),
    ]
  }
}
