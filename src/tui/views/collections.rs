//! Collections overview — browse collections and pick one to operate on.
//!
//! Listing is loaded progressively through the shared page loader, same as
//! the per-collection tables.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use uuid::Uuid;

use super::super::theme;
use crate::client::Collection;
use crate::state::{spawn_page_loader, LoadOutcome, ResourceList, FETCH_PAGE_SIZE};
use crate::tui::services::Services;

/// Outcome of handling a key in the overview.
#[derive(Debug, PartialEq, Eq)]
pub enum OverviewResult {
    Consumed,
    NotHandled,
    Open(Uuid),
}

// ── State ──────────────────────────────────────────────────────────────────

pub struct OverviewState {
    list: ResourceList<Collection>,
    cursor: usize,
}

impl OverviewState {
    pub fn new() -> Self {
        Self {
            list: ResourceList::new(),
            cursor: 0,
        }
    }

    pub fn load(&mut self, services: &Services) {
        if self.list.is_loading() {
            return;
        }
        let handle = self.list.begin_load();
        let api = services.api.clone();
        spawn_page_loader("collections", handle, move |offset| {
            let api = api.clone();
            async move { api.list_collections(offset, FETCH_PAGE_SIZE).await }
        });
    }

    pub fn poll(&mut self) {
        if self.list.poll() {
            self.clamp_cursor();
        }
    }

    fn clamp_cursor(&mut self) {
        if self.cursor >= self.list.len() {
            self.cursor = self.list.len().saturating_sub(1);
        }
    }

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> OverviewResult {
        let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            modifiers,
            ..
        }) = event
        else {
            return OverviewResult::NotHandled;
        };

        match (*modifiers, *code) {
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                if self.cursor + 1 < self.list.len() {
                    self.cursor += 1;
                }
                OverviewResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.cursor = self.cursor.saturating_sub(1);
                OverviewResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('g') | KeyCode::Home) => {
                self.cursor = 0;
                OverviewResult::Consumed
            }
            (KeyModifiers::SHIFT, KeyCode::Char('G')) | (KeyModifiers::NONE, KeyCode::End) => {
                self.cursor = self.list.len().saturating_sub(1);
                OverviewResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::PageDown) => {
                self.cursor = (self.cursor + 10).min(self.list.len().saturating_sub(1));
                OverviewResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::PageUp) => {
                self.cursor = self.cursor.saturating_sub(10);
                OverviewResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) => {
                self.load(services);
                OverviewResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Enter) => match self.list.items().get(self.cursor) {
                Some(collection) => OverviewResult::Open(collection.id),
                None => OverviewResult::Consumed,
            },
            _ => OverviewResult::NotHandled,
        }
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let summary = self.summary_line();
        let block = theme::block_focused("Collections");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.list.is_loading() && self.list.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    " Loading collections...",
                    theme::muted(),
                ))),
                inner,
            );
            return;
        }

        if self.list.outcome() == Some(LoadOutcome::Failed) && self.list.is_empty() {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::raw(""),
                    Line::from(Span::styled(
                        " Failed to load collections",
                        Style::default().fg(theme::ERROR),
                    )),
                    Line::from(Span::styled(" Press r to retry", theme::muted())),
                ]),
                inner,
            );
            return;
        }

        if self.list.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    " No collections yet — press o to open one by id",
                    theme::muted(),
                ))),
                inner,
            );
            return;
        }

        let mut lines: Vec<Line<'static>> = Vec::with_capacity(inner.height as usize);
        lines.push(summary);
        lines.push(Line::from(Span::styled(
            format!("   {:<28} {:<10} {:<12} DESCRIPTION", "NAME", "ID", "CREATED"),
            theme::heading(),
        )));

        // Keep the cursor inside the viewport.
        let row_capacity = inner.height.saturating_sub(2) as usize;
        let start = self.cursor.saturating_sub(row_capacity.saturating_sub(1));
        let end = (start + row_capacity).min(self.list.len());

        for (idx, collection) in self.list.items()[start..end].iter().enumerate() {
            let absolute = start + idx;
            let pointer = if absolute == self.cursor { "▸ " } else { "  " };
            let description = collection.description.as_deref().unwrap_or("");
            let line = Line::from(vec![
                Span::raw(pointer.to_string()),
                Span::styled(
                    format!("{:<29}", truncate(&collection.name, 28)),
                    Style::default().fg(theme::TEXT),
                ),
                Span::styled(format!("{:<11}", short_id(collection.id)), theme::muted()),
                Span::styled(
                    format!("{:<13}", collection.created_at.format("%Y-%m-%d")),
                    theme::muted(),
                ),
                Span::styled(truncate(description, 38), theme::dim()),
            ]);
            if absolute == self.cursor {
                lines.push(line.style(theme::row_cursor()));
            } else {
                lines.push(line);
            }
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn summary_line(&self) -> Line<'static> {
        let mut spans = vec![Span::styled(
            format!(" {} collections", self.list.total_entries()),
            theme::muted(),
        )];
        if self.list.is_loading() {
            spans.push(Span::styled("  syncing…", Style::default().fg(theme::WARNING)));
        } else if self.list.outcome() == Some(LoadOutcome::Partial) {
            spans.push(Span::styled(
                "  partial data",
                Style::default().fg(theme::WARNING),
            ));
        }
        Line::from(spans)
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// First segment of a UUID, enough to eyeball identity in a table.
pub fn short_id(id: Uuid) -> String {
    let text = id.to_string();
    format!("{}…", &text[..8])
}

/// Truncate to `max` chars with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}
