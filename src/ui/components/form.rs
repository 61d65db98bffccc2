use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::validation::{Field, ValidationFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  Submitted,
  Cancelled,
}

#[derive(Debug, Clone)]
struct FormField {
  field: Field,
  input: TextInput,
  error: Option<String>,
}

/// Vertical list of labelled inputs with inline validation messages.
///
/// Tab/Down and Shift-Tab/Up move focus, Enter submits, Esc cancels.
#[derive(Debug, Clone, Default)]
pub struct Form {
  fields: Vec<FormField>,
  focus: usize,
}

impl Form {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_field(mut self, field: Field, input: TextInput) -> Self {
    self.fields.push(FormField {
      field,
      input,
      error: None,
    });
    self
  }

  /// Drop a field, e.g. the password confirmation when leaving sign-up
  pub fn remove_field(&mut self, field: Field) {
    self.fields.retain(|f| f.field != field);
    self.focus = self.focus.min(self.fields.len().saturating_sub(1));
  }

  pub fn has_field(&self, field: Field) -> bool {
    self.fields.iter().any(|f| f.field == field)
  }

  pub fn value(&self, field: Field) -> &str {
    self
      .fields
      .iter()
      .find(|f| f.field == field)
      .map(|f| f.input.value())
      .unwrap_or("")
  }

  pub fn focused(&self) -> Option<Field> {
    self.fields.get(self.focus).map(|f| f.field)
  }

  pub fn error(&self, field: Field) -> Option<&str> {
    self
      .fields
      .iter()
      .find(|f| f.field == field)
      .and_then(|f| f.error.as_deref())
  }

  /// Show each message under its field and focus the first invalid one
  pub fn set_errors(&mut self, failure: &ValidationFailure) {
    for f in &mut self.fields {
      f.error = failure.message_for(f.field).map(String::from);
    }
    if let Some(first) = self.fields.iter().position(|f| f.error.is_some()) {
      self.focus = first;
    }
  }

  pub fn clear_errors(&mut self) {
    for f in &mut self.fields {
      f.error = None;
    }
  }

  fn move_focus(&mut self, forward: bool) {
    let len = self.fields.len();
    if len == 0 {
      return;
    }
    self.focus = if forward {
      (self.focus + 1) % len
    } else {
      (self.focus + len - 1) % len
    };
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    match key.code {
      KeyCode::Enter => return KeyResult::Event(FormEvent::Submitted),
      KeyCode::Esc => return KeyResult::Event(FormEvent::Cancelled),
      KeyCode::Tab | KeyCode::Down => {
        self.move_focus(true);
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.move_focus(false);
        return KeyResult::Handled;
      }
      _ => {}
    }

    let Some(current) = self.fields.get_mut(self.focus) else {
      return KeyResult::NotHandled;
    };
    match current.input.handle_key(key) {
      InputResult::Consumed => {
        // Editing a field retires its stale message
        current.error = None;
        KeyResult::Handled
      }
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  /// Rows needed to draw the form inside a bordered block
  pub fn height(&self) -> u16 {
    self.fields.len() as u16 * 3 + 2
  }

  pub fn render(&self, frame: &mut Frame, area: Rect, title: &str, busy: bool) {
    let border = if busy { Color::DarkGray } else { Color::Blue };
    let block = Block::default()
      .title(format!(" {} ", title))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
      .direction(Direction::Vertical)
      .constraints(self.fields.iter().map(|_| Constraint::Length(3)))
      .split(inner);

    for (i, (f, row)) in self.fields.iter().zip(rows.iter()).enumerate() {
      let focused = i == self.focus && !busy;
      let label_style = if focused {
        Style::default().fg(Color::Yellow).bold()
      } else {
        Style::default().fg(Color::White)
      };

      let label = Span::styled(format!("{:<18}", f.field.label()), label_style);
      let value = if focused {
        let text = f.input.display();
        let at = f.input.cursor_position();
        let before: String = text.chars().take(at).collect();
        let after: String = text.chars().skip(at).collect();
        vec![
          label,
          Span::raw(before),
          Span::styled("_", Style::default().fg(Color::Yellow)),
          Span::raw(after),
        ]
      } else {
        vec![label, Span::raw(f.input.display())]
      };

      let mut lines = vec![Line::from(value)];
      if let Some(error) = &f.error {
        lines.push(Line::from(vec![
          Span::raw(" ".repeat(18)),
          Span::styled(error.clone(), Style::default().fg(Color::Red)),
        ]));
      }

      frame.render_widget(Paragraph::new(lines), *row);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::validation::validate_user_form;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(form: &mut Form, s: &str) {
    for c in s.chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
  }

  fn user_form() -> Form {
    Form::new()
      .with_field(Field::Email, TextInput::new())
      .with_field(Field::FirstName, TextInput::new())
      .with_field(Field::LastName, TextInput::new())
  }

  #[test]
  fn test_typing_goes_to_focused_field() {
    let mut form = user_form();
    type_str(&mut form, "ada@reqres.in");
    form.handle_key(key(KeyCode::Tab));
    type_str(&mut form, "Ada");

    assert_eq!(form.value(Field::Email), "ada@reqres.in");
    assert_eq!(form.value(Field::FirstName), "Ada");
    assert_eq!(form.value(Field::LastName), "");
  }

  #[test]
  fn test_focus_wraps() {
    let mut form = user_form();
    form.handle_key(key(KeyCode::Up));
    assert_eq!(form.focused(), Some(Field::LastName));
    form.handle_key(key(KeyCode::Down));
    assert_eq!(form.focused(), Some(Field::Email));
  }

  #[test]
  fn test_enter_and_esc_are_events() {
    let mut form = user_form();
    assert_eq!(
      form.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FormEvent::Submitted)
    );
    assert_eq!(
      form.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(FormEvent::Cancelled)
    );
  }

  #[test]
  fn test_errors_shown_inline_and_cleared_on_edit() {
    let mut form = user_form();
    type_str(&mut form, "ada@reqres.in");

    let failure = validate_user_form(
      form.value(Field::Email),
      form.value(Field::FirstName),
      form.value(Field::LastName),
    )
    .unwrap_err();
    form.set_errors(&failure);

    assert_eq!(form.error(Field::Email), None);
    assert_eq!(form.error(Field::FirstName), Some("First name is required"));
    assert_eq!(form.error(Field::LastName), Some("Last name is required"));
    assert_eq!(form.focused(), Some(Field::FirstName));

    type_str(&mut form, "A");
    assert_eq!(form.error(Field::FirstName), None);
    assert_eq!(form.error(Field::LastName), Some("Last name is required"));
  }

  #[test]
  fn test_remove_field_keeps_focus_in_range() {
    let mut form = user_form();
    form.handle_key(key(KeyCode::Up));
    form.remove_field(Field::LastName);
    assert!(!form.has_field(Field::LastName));
    assert_eq!(form.focused(), Some(Field::FirstName));
  }
}
