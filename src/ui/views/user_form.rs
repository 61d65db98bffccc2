use crate::api::types::{User, UserFields};
use crate::api::UsersApi;
use crate::app::AppContext;
use crate::query::Mutation;
use crate::ui::components::{Form, FormEvent, KeyResult, TextInput};
use crate::ui::renderfns::centered_rect;
use crate::ui::view::{ShortcutInfo, StatusMessage, View, ViewAction};
use crate::validation::{validate_user_form, Field};
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

enum Mode {
  Create,
  Edit { id: u64, name: String },
}

/// Create or edit a user. Pops back to the list once the remote accepts it.
pub struct UserFormView<A> {
  ctx: AppContext<A>,
  mode: Mode,
  form: Form,
  save: Mutation<()>,
  status: Option<StatusMessage>,
}

impl<A: UsersApi + 'static> UserFormView<A> {
  pub fn create(ctx: AppContext<A>) -> Self {
    Self::with_form(ctx, Mode::Create, UserFields::default())
  }

  pub fn edit(ctx: AppContext<A>, user: User) -> Self {
    let fields = UserFields::from(&user);
    let mode = Mode::Edit {
      id: user.id,
      name: user.full_name(),
    };
    Self::with_form(ctx, mode, fields)
  }

  fn with_form(ctx: AppContext<A>, mode: Mode, fields: UserFields) -> Self {
    let form = Form::new()
      .with_field(Field::Email, TextInput::new().with_value(&fields.email))
      .with_field(
        Field::FirstName,
        TextInput::new().with_value(&fields.first_name),
      )
      .with_field(
        Field::LastName,
        TextInput::new().with_value(&fields.last_name),
      );

    Self {
      ctx,
      mode,
      form,
      save: Mutation::new(),
      status: None,
    }
  }

  fn fields(&self) -> UserFields {
    UserFields {
      email: self.form.value(Field::Email).trim().to_string(),
      first_name: self.form.value(Field::FirstName).trim().to_string(),
      last_name: self.form.value(Field::LastName).trim().to_string(),
    }
  }

  fn submit(&mut self) {
    if self.save.is_pending() {
      return;
    }

    let fields = self.fields();
    if let Err(failure) = validate_user_form(&fields.email, &fields.first_name, &fields.last_name) {
      self.form.set_errors(&failure);
      return;
    }
    self.form.clear_errors();

    let users = self.ctx.users.clone();
    match &self.mode {
      Mode::Create => {
        self.save.start(async move {
          users
            .create_user(fields)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
        });
      }
      Mode::Edit { id, .. } => {
        let id = *id;
        self.save.start(async move {
          users
            .update_user(id, fields)
            .await
            .map_err(|e| e.to_string())
        });
      }
    }
    self.status = Some(StatusMessage::Info("Saving...".to_string()));
  }

  fn title(&self) -> &str {
    match self.mode {
      Mode::Create => "New user",
      Mode::Edit { .. } => "Edit user",
    }
  }
}

impl<A: UsersApi + 'static> View for UserFormView<A> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted) => {
        self.submit();
        ViewAction::None
      }
      // The write may still land; the list picks it up on resume
      KeyResult::Event(FormEvent::Cancelled) => ViewAction::Pop,
      KeyResult::Handled | KeyResult::NotHandled => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let form_area = centered_rect(area.width.min(72), self.form.height(), area);
    self
      .form
      .render(frame, form_area, self.title(), self.save.is_pending());
  }

  fn breadcrumb_label(&self) -> String {
    match &self.mode {
      Mode::Create => "New user".to_string(),
      Mode::Edit { name, .. } => format!("Edit {}", name),
    }
  }

  fn tick(&mut self) -> ViewAction {
    match self.save.poll() {
      Some(Ok(())) => ViewAction::Pop,
      Some(Err(e)) => {
        // Keep the form open for another try
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
    vec![
      ShortcutInfo::new("tab", "next field").with_priority(10),
      ShortcutInfo::new("enter", "save").with_priority(20),
      ShortcutInfo::new("esc", "cancel").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::cached_client::CachedUsersClient;
  use crate::api::fake::{fake_user, FakeUsersApi};
  use crate::auth::Auth;
  use crate::session::SessionStore;
  use crossterm::event::{KeyCode, KeyModifiers};
  use std::sync::Arc;
  use std::time::Duration;

  fn ctx(total: u64) -> (AppContext<FakeUsersApi>, Arc<FakeUsersApi>) {
    let api = Arc::new(FakeUsersApi::with_users(total));
    let session = Arc::new(SessionStore::open_in_memory().unwrap());
    let ctx = AppContext {
      users: CachedUsersClient::new(Arc::clone(&api), chrono::Duration::minutes(5)),
      auth: Auth::new(Arc::clone(&api), session),
    };
    (ctx, api)
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(view: &mut UserFormView<FakeUsersApi>, s: &str) {
    for c in s.chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[tokio::test]
  async fn test_invalid_form_stays_open_with_messages() {
    let (ctx, _api) = ctx(12);
    let mut view = UserFormView::create(ctx);
    type_str(&mut view, "not-an-email");
    view.handle_key(key(KeyCode::Enter));

    assert!(!view.save.is_pending());
    assert_eq!(
      view.form.error(Field::Email),
      Some("Please enter a valid email address")
    );
    assert_eq!(view.form.error(Field::FirstName), Some("First name is required"));
  }

  #[tokio::test]
  async fn test_create_lands_on_first_page_and_pops() {
    let (ctx, _api) = ctx(12);
    ctx.users.list_users(1).await.unwrap();
    let mut view = UserFormView::create(ctx.clone());

    type_str(&mut view, "ada@reqres.in");
    view.handle_key(key(KeyCode::Tab));
    type_str(&mut view, "Ada");
    view.handle_key(key(KeyCode::Tab));
    type_str(&mut view, "Lovelace");
    view.handle_key(key(KeyCode::Enter));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(matches!(view.tick(), ViewAction::Pop));

    let page1 = ctx.users.list_users(1).await.unwrap();
    assert_eq!(page1.data.data[0].full_name(), "Ada Lovelace");
    assert_eq!(page1.data.total, 13);
  }

  #[tokio::test]
  async fn test_edit_prefills_and_updates() {
    let (ctx, _api) = ctx(12);
    ctx.users.list_users(1).await.unwrap();
    let mut view = UserFormView::edit(ctx.clone(), fake_user(3));
    assert_eq!(view.breadcrumb_label(), "Edit First3 Last3");
    assert_eq!(view.fields(), UserFields::from(&fake_user(3)));

    view.handle_key(key(KeyCode::Tab));
    view.handle_key(key(KeyCode::Char('x')));
    view.handle_key(key(KeyCode::Enter));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(matches!(view.tick(), ViewAction::Pop));

    let page1 = ctx.users.list_users(1).await.unwrap();
    assert_eq!(page1.data.data[2].first_name, "First3x");
  }

  #[tokio::test]
  async fn test_remote_failure_keeps_form_open() {
    let (ctx, api) = ctx(12);
    api.set_failing(true);
    let mut view = UserFormView::edit(ctx, fake_user(3));
    view.handle_key(key(KeyCode::Enter));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(matches!(view.tick(), ViewAction::None));
    assert_eq!(
      view.status(),
      Some(&StatusMessage::Error("Failed to update user".to_string()))
    );
  }
}
