//! Collection switcher modal overlay.
//!
//! Global overlay activated by `o` or `Action::OpenSwitcher`. Takes a
//! collection id and jumps straight to that collection, mirroring deep
//! links into the web dashboard.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use uuid::Uuid;

use crate::tui::theme;
use crate::tui::widgets::InputBuffer;

/// What the app should do after the switcher handled a key.
#[derive(Debug, PartialEq, Eq)]
pub enum SwitcherResult {
    Consumed,
    Close,
    Open(Uuid),
}

/// State for the collection switcher modal.
pub struct SwitcherState {
    input: InputBuffer,
    error: Option<String>,
}

impl SwitcherState {
    pub fn new() -> Self {
        Self {
            input: InputBuffer::new(),
            error: None,
        }
    }

    pub fn handle_input(&mut self, event: &Event) -> SwitcherResult {
        let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            modifiers,
            ..
        }) = event
        else {
            return SwitcherResult::Consumed;
        };

        match code {
            KeyCode::Esc => SwitcherResult::Close,
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.backspace();
                self.error = None;
                SwitcherResult::Consumed
            }
            KeyCode::Delete => {
                self.input.delete();
                self.error = None;
                SwitcherResult::Consumed
            }
            KeyCode::Left => {
                self.input.move_left();
                SwitcherResult::Consumed
            }
            KeyCode::Right => {
                self.input.move_right();
                SwitcherResult::Consumed
            }
            KeyCode::Home => {
                self.input.move_home();
                SwitcherResult::Consumed
            }
            KeyCode::End => {
                self.input.move_end();
                SwitcherResult::Consumed
            }
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.insert_char(*c);
                self.error = None;
                SwitcherResult::Consumed
            }
            _ => SwitcherResult::Consumed,
        }
    }

    fn submit(&mut self) -> SwitcherResult {
        let raw = self.input.text().trim().to_string();
        if raw.is_empty() {
            self.error = Some("Enter a collection id".to_string());
            return SwitcherResult::Consumed;
        }
        match Uuid::parse_str(&raw) {
            Ok(id) => {
                self.input.clear();
                self.error = None;
                SwitcherResult::Open(id)
            }
            Err(_) => {
                self.error = Some("Not a valid UUID".to_string());
                SwitcherResult::Consumed
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let modal_area = centered_fixed(58, 8, area);

        let block = Block::default()
            .title(" Open Collection ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(theme::border_focused());

        let mut lines = vec![
            Line::raw(""),
            Line::from(vec![
                Span::raw("  Collection id: "),
                Span::styled(
                    format!("{}█", self.input.text()),
                    Style::default().fg(theme::TEXT),
                ),
            ]),
        ];

        if let Some(error) = &self.error {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(error.clone(), Style::default().fg(theme::ERROR)),
            ]));
        } else {
            lines.push(Line::raw(""));
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled("Enter", theme::key_hint()),
            Span::raw(":open  "),
            Span::styled("Esc", theme::key_hint()),
            Span::raw(":cancel"),
        ]));

        frame.render_widget(Clear, modal_area);
        frame.render_widget(Paragraph::new(lines).block(block), modal_area);
    }
}

/// Compute a centered rectangle with fixed dimensions.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
