use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use super::KeyResult;
use crate::ui::renderfns::centered_rect;

/// Yes/no prompt drawn over the current view.
///
/// While open it swallows every key; `y`/Enter confirm, `n`/Esc cancel.
#[derive(Debug, Clone, Default)]
pub struct ConfirmPrompt {
  message: Option<String>,
}

impl ConfirmPrompt {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn open(&mut self, message: impl Into<String>) {
    self.message = Some(message.into());
  }

  pub fn is_open(&self) -> bool {
    self.message.is_some()
  }

  /// `Event(true)` when confirmed, `Event(false)` when dismissed
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<bool> {
    if !self.is_open() {
      return KeyResult::NotHandled;
    }
    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
        self.message = None;
        KeyResult::Event(true)
      }
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
        self.message = None;
        KeyResult::Event(false)
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let Some(message) = &self.message else {
      return;
    };

    let overlay = centered_rect(50, 6, area);
    frame.render_widget(Clear, overlay);

    let block = Block::default()
      .title(" Confirm ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));

    let text = vec![
      Line::from(message.as_str()),
      Line::from(""),
      Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Cyan)),
        Span::styled(" yes   ", Style::default().fg(Color::DarkGray)),
        Span::styled("<n>", Style::default().fg(Color::Cyan)),
        Span::styled(" no", Style::default().fg(Color::DarkGray)),
      ]),
    ];

    let paragraph = Paragraph::new(text)
      .block(block)
      .alignment(Alignment::Center)
      .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, overlay);
  }
}
