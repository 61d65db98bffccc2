use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// One-line message shown in the footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
  Info(String),
  Error(String),
}

impl StatusMessage {
  pub fn text(&self) -> &str {
    match self {
      StatusMessage::Info(s) | StatusMessage::Error(s) => s,
    }
  }
}

/// Actions that a view can request from the App
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
  /// Swap the current view for another, e.g. after signing in or out
  Replace(Box<dyn View>),
  /// Leave the application
  Quit,
}

impl std::fmt::Debug for ViewAction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ViewAction::None => write!(f, "None"),
      ViewAction::Push(v) => write!(f, "Push({})", v.breadcrumb_label()),
      ViewAction::Pop => write!(f, "Pop"),
      ViewAction::Replace(v) => write!(f, "Replace({})", v.breadcrumb_label()),
      ViewAction::Quit => write!(f, "Quit"),
    }
  }
}

/// Trait for view behavior
///
/// Views own their input handling and async work, and return actions for
/// the App to execute: App → View → Components.
///
/// Views that load or write data hold `Query<T>`/`Mutation<T>` handles and
/// poll them in `tick()`.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to poll async work. Finished work may navigate.
  fn tick(&mut self) -> ViewAction {
    ViewAction::None
  }

  /// Called when the view above this one was popped
  fn on_resume(&mut self) {}

  /// Message for the footer, if any
  fn status(&self) -> Option<&StatusMessage> {
    None
  }

  /// Keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![ShortcutInfo::new("esc", "back").with_priority(90)]
  }
}
