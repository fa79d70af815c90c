use std::io;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use super::events::{Action, AppEvent, Focus, Notification, NotificationLevel};
use super::services::Services;
use super::theme;
use super::views::collection::{CollectionViewState, DetailResult};
use super::views::collections::{OverviewResult, OverviewState};
use super::views::switcher::{SwitcherResult, SwitcherState};
use crate::client::CollectionId;

/// Central application state (Elm architecture).
pub struct AppState {
    /// Whether the app is still running.
    pub running: bool,
    /// Currently focused top-level view.
    pub focus: Focus,
    /// Collection overview state.
    pub overview: OverviewState,
    /// Collection detail state.
    pub collection: CollectionViewState,
    /// Active notifications (max 3 visible).
    pub notifications: Vec<Notification>,
    /// Monotonic counter for notification IDs.
    notification_counter: u64,
    /// Whether the help modal is open.
    pub show_help: bool,
    /// Open-by-id prompt (Some when open).
    pub switcher: Option<SwitcherState>,
    /// Collection to open on startup, from the CLI.
    initial_collection: Option<CollectionId>,
    /// Receiver for backend events.
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    /// Sender for pushing events from within the app.
    #[allow(dead_code)]
    event_tx: mpsc::UnboundedSender<AppEvent>,
    /// Backend services handle.
    services: Services,
}

impl AppState {
    pub fn new(
        event_rx: mpsc::UnboundedReceiver<AppEvent>,
        event_tx: mpsc::UnboundedSender<AppEvent>,
        services: Services,
        initial_collection: Option<CollectionId>,
    ) -> Self {
        Self {
            running: true,
            focus: Focus::Overview,
            overview: OverviewState::new(),
            collection: CollectionViewState::new(),
            notifications: Vec::new(),
            notification_counter: 0,
            show_help: false,
            switcher: None,
            initial_collection,
            event_rx,
            event_tx,
            services,
        }
    }

    // ── Elm event loop ──────────────────────────────────────────────────

    /// Main event loop: render → select → update → loop.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick_rate: Duration,
    ) -> io::Result<()> {
        let mut tick_interval = tokio::time::interval(tick_rate);
        let mut event_stream = EventStream::new();

        match self.initial_collection.take() {
            Some(id) => self.handle_action(Action::OpenCollection(id)),
            None => self.overview.load(&self.services),
        }

        while self.running {
            // Render
            terminal.draw(|frame| self.render(frame))?;

            // Select next event
            tokio::select! {
                _ = tick_interval.tick() => {
                    self.on_tick();
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
                Some(Ok(crossterm_event)) = event_stream.next() => {
                    self.handle_event(AppEvent::Input(crossterm_event));
                }
            }
        }

        Ok(())
    }

    // ── Event handling ──────────────────────────────────────────────────

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(crossterm_event) => {
                // Priority 1: open-by-id prompt consumes all input when open
                if let Some(ref mut switcher) = self.switcher {
                    match switcher.handle_input(&crossterm_event) {
                        SwitcherResult::Consumed => {}
                        SwitcherResult::Close => {
                            self.switcher = None;
                        }
                        SwitcherResult::Open(id) => {
                            self.switcher = None;
                            self.handle_action(Action::OpenCollection(id));
                        }
                    }
                    return;
                }

                // Priority 2: Help modal
                if self.show_help {
                    if let Some(action) = self.map_help_input(&crossterm_event) {
                        self.handle_action(action);
                    }
                    return;
                }

                // Priority 3: Focused view
                if self.dispatch_view_input(&crossterm_event) {
                    return;
                }

                // Priority 4: Global keybindings
                if let Some(action) = self.map_input_to_action(crossterm_event) {
                    self.handle_action(action);
                }
            }
            AppEvent::Action(action) => self.handle_action(action),
            AppEvent::Tick => self.on_tick(),
            AppEvent::Notification(notification) => {
                self.push_notification(notification.message, notification.level);
            }
            AppEvent::Quit => {
                self.running = false;
            }
        }
    }

    /// Dispatch input to the currently focused view. Returns true if consumed.
    fn dispatch_view_input(&mut self, event: &Event) -> bool {
        match self.focus {
            Focus::Overview => match self.overview.handle_input(event, &self.services) {
                OverviewResult::Consumed => true,
                OverviewResult::Open(id) => {
                    self.handle_action(Action::OpenCollection(id));
                    true
                }
                OverviewResult::NotHandled => false,
            },
            Focus::Collection => match self.collection.handle_input(event, &self.services) {
                DetailResult::Consumed => true,
                DetailResult::Back => {
                    self.handle_action(Action::FocusOverview);
                    true
                }
                DetailResult::NotHandled => false,
            },
        }
    }

    // ── Input mapping ───────────────────────────────────────────────────

    /// Map help modal input to action.
    fn map_help_input(&self, event: &Event) -> Option<Action> {
        let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return None;
        };
        match code {
            KeyCode::Esc | KeyCode::Char('?') => Some(Action::CloseHelp),
            _ => None,
        }
    }

    fn map_input_to_action(&self, event: Event) -> Option<Action> {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return None;
        };

        // Global keybindings (active when no modal or view consumes)
        match (modifiers, code) {
            // Ctrl+C → quit
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(Action::Quit),
            // No modifiers
            (KeyModifiers::NONE | KeyModifiers::SHIFT, _) => match code {
                KeyCode::Char('q') => Some(Action::Quit),
                KeyCode::Char('?') => Some(Action::ShowHelp),
                KeyCode::Char('o') => Some(Action::OpenSwitcher),
                KeyCode::Char('1') => Some(Action::FocusOverview),
                _ => None,
            },
            _ => None,
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::FocusOverview => {
                self.focus = Focus::Overview;
                self.overview.load(&self.services);
            }
            Action::OpenCollection(id) => {
                self.focus = Focus::Collection;
                self.collection.open_collection(id, &self.services);
            }
            Action::OpenSwitcher => {
                self.switcher = Some(SwitcherState::new());
            }
            Action::CloseSwitcher => {
                self.switcher = None;
            }
            Action::ShowHelp => self.show_help = true,
            Action::CloseHelp => self.show_help = false,
            Action::RefreshData => match self.focus {
                Focus::Overview => self.overview.load(&self.services),
                Focus::Collection => self.collection.refetch(&self.services),
            },
        }
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// Push a notification (dedup by message, max 3).
    pub fn push_notification(&mut self, message: String, level: NotificationLevel) {
        if self.notifications.iter().any(|n| n.message == message) {
            return;
        }

        self.notification_counter += 1;
        self.notifications.push(Notification {
            id: self.notification_counter,
            message,
            level,
            ttl_ticks: 100,
        });

        while self.notifications.len() > 3 {
            self.notifications.remove(0);
        }
    }

    /// Tick: decrement notification TTLs, dismiss expired, poll async data.
    fn on_tick(&mut self) {
        for n in &mut self.notifications {
            n.ttl_ticks = n.ttl_ticks.saturating_sub(1);
        }
        self.notifications.retain(|n| n.ttl_ticks > 0);

        // Poll async view data
        self.overview.poll();
        self.collection.poll(&self.services);
    }

    // ── Rendering ───────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        self.render_content(frame, chunks[0]);
        self.render_status_bar(frame, chunks[1]);

        // Overlays
        self.render_notifications(frame, area);

        if self.show_help {
            self.render_help_modal(frame, area);
        }

        if let Some(ref switcher) = self.switcher {
            switcher.render(frame, area);
        }
    }

    fn render_content(&self, frame: &mut Frame, area: Rect) {
        match self.focus {
            Focus::Overview => self.overview.render(frame, area),
            Focus::Collection => self.collection.render(frame, area),
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let hints: &[(&str, &str)] = match self.focus {
            Focus::Overview => &[
                ("Enter", ":open "),
                ("o", ":by id "),
                ("r", ":refresh "),
                ("?", ":help "),
                ("q", ":quit"),
            ],
            Focus::Collection => &[
                ("Tab", ":tabs "),
                ("/", ":search "),
                ("f", ":filters "),
                ("space", ":select "),
                ("d", ":remove "),
                ("Esc", ":back "),
                ("?", ":help"),
            ],
        };

        let mut spans = vec![
            Span::styled(" CURATOR ", theme::brand_badge()),
            Span::raw(" "),
            Span::styled(
                self.focus.label(),
                Style::default()
                    .fg(theme::PRIMARY_LIGHT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" │ "),
        ];
        for (key, desc) in hints {
            spans.push(Span::styled(*key, theme::key_hint()));
            spans.push(Span::raw(*desc));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect) {
        if self.notifications.is_empty() {
            return;
        }

        let max_width = 50.min(area.width.saturating_sub(2));
        let height = self.notifications.len() as u16;
        let x = area.width.saturating_sub(max_width + 1);
        let y = 1;

        let notification_area = Rect::new(x, y, max_width, height);

        let lines: Vec<Line> = self
            .notifications
            .iter()
            .map(|n| {
                let (prefix, color) = match n.level {
                    NotificationLevel::Info => ("ℹ", theme::INFO),
                    NotificationLevel::Success => ("✓", theme::SUCCESS),
                    NotificationLevel::Warning => ("⚠", theme::WARNING),
                    NotificationLevel::Error => ("✗", theme::ERROR),
                };
                Line::from(vec![
                    Span::styled(
                        format!(" {prefix} "),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(&n.message),
                ])
            })
            .collect();

        frame.render_widget(Clear, notification_area);
        frame.render_widget(Paragraph::new(lines), notification_area);
    }

    fn render_help_modal(&self, frame: &mut Frame, area: Rect) {
        let modal = centered_rect(60, 80, area);

        let keybindings = vec![
            ("Global:", ""),
            ("q", "Quit application"),
            ("?", "Toggle this help"),
            ("o", "Open a collection by id"),
            ("Ctrl+C", "Force quit"),
            ("Esc", "Close modal / go back"),
            ("", ""),
            ("Collections:", ""),
            ("j/k", "Navigate list"),
            ("g/G", "Jump to top / bottom"),
            ("Enter", "Open selected collection"),
            ("r", "Refresh data"),
            ("", ""),
            ("Collection:", ""),
            ("Tab / Shift+Tab", "Switch documents / users"),
            ("j/k", "Move cursor"),
            ("h/l", "Previous / next page"),
            ("/", "Search title or id"),
            ("f", "Focus status filters"),
            ("space", "Select document"),
            ("a", "Select all visible"),
            ("s", "Cycle sort"),
            ("i / Enter", "Inspect document"),
            ("m", "Manage name / description"),
            ("x", "Remove row under cursor"),
            ("d", "Remove selected documents"),
            ("r", "Refetch collection data"),
            ("", ""),
            ("Search:", ""),
            ("Enter", "Keep query, back to list"),
            ("Esc", "Clear query, back to list"),
            ("", ""),
            ("Filters:", ""),
            ("j/k", "Move between statuses"),
            ("space", "Toggle status"),
        ];

        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled(
                " Keybindings",
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::raw(""),
        ];

        for (key, desc) in &keybindings {
            if key.is_empty() {
                lines.push(Line::raw(""));
            } else if desc.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("  {key}"),
                    Style::default()
                        .fg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                )));
            } else {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(
                        format!("{:<22}", key),
                        Style::default()
                            .fg(theme::PRIMARY_LIGHT)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(*desc),
                ]));
            }
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw("  Press "),
            Span::styled(
                "?",
                Style::default()
                    .fg(theme::PRIMARY_LIGHT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" or "),
            Span::styled(
                "Esc",
                Style::default()
                    .fg(theme::PRIMARY_LIGHT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" to close"),
        ]));

        let block = Block::default()
            .title(" Help ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ACCENT));

        frame.render_widget(Clear, modal);
        frame.render_widget(Paragraph::new(lines).block(block), modal);
    }
}

/// Calculate a centered rect using percentage of parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockCollectionApi;
    use std::sync::Arc;
    use uuid::Uuid;

    fn test_app() -> AppState {
        let (tx, rx) = mpsc::unbounded_channel();
        let services = Services::with_api(Arc::new(MockCollectionApi::new()), tx.clone());
        AppState::new(rx, tx, services, None)
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    #[test]
    fn test_focus_all_labels() {
        for f in Focus::ALL {
            assert!(!f.label().is_empty());
        }
    }

    #[test]
    fn test_quit_key_stops_loop() {
        let mut app = test_app();
        assert!(app.running);
        app.handle_event(key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn test_help_toggles() {
        let mut app = test_app();
        app.handle_event(key(KeyCode::Char('?')));
        assert!(app.show_help);
        // All other keys are swallowed while help is open.
        app.handle_event(key(KeyCode::Char('q')));
        assert!(app.running);
        app.handle_event(key(KeyCode::Esc));
        assert!(!app.show_help);
    }

    #[test]
    fn test_notification_dedup_and_cap() {
        let mut app = test_app();
        app.push_notification("same".to_string(), NotificationLevel::Info);
        app.push_notification("same".to_string(), NotificationLevel::Info);
        assert_eq!(app.notifications.len(), 1);

        for i in 0..5 {
            app.push_notification(format!("msg {i}"), NotificationLevel::Info);
        }
        assert_eq!(app.notifications.len(), 3);
    }

    #[test]
    fn test_notification_ttl_expiry() {
        let mut app = test_app();
        app.push_notification("fading".to_string(), NotificationLevel::Success);
        for _ in 0..100 {
            app.on_tick();
        }
        assert!(app.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_switcher_opens_collection() {
        let mut mock = MockCollectionApi::new();
        mock.expect_retrieve_collection().returning(|id| {
            Ok(crate::client::Collection {
                id,
                name: "x".to_string(),
                description: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            })
        });
        mock.expect_list_documents()
            .returning(|_, _, _| Ok(crate::client::Page::empty()));
        mock.expect_list_users()
            .returning(|_, _, _| Ok(crate::client::Page::empty()));

        let (tx, rx) = mpsc::unbounded_channel();
        let services = Services::with_api(Arc::new(mock), tx.clone());
        let mut app = AppState::new(rx, tx, services, None);

        app.handle_event(key(KeyCode::Char('o')));
        assert!(app.switcher.is_some());

        let id = Uuid::from_u128(42);
        for c in id.to_string().chars() {
            app.handle_event(key(KeyCode::Char(c)));
        }
        app.handle_event(key(KeyCode::Enter));

        assert!(app.switcher.is_none());
        assert_eq!(app.focus, Focus::Collection);
        assert_eq!(app.collection.collection_id(), Some(id));
    }

    #[tokio::test]
    async fn test_q_types_into_search_instead_of_quitting() {
        let mut mock = MockCollectionApi::new();
        mock.expect_retrieve_collection().returning(|id| {
            Ok(crate::client::Collection {
                id,
                name: "x".to_string(),
                description: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            })
        });
        mock.expect_list_documents()
            .returning(|_, _, _| Ok(crate::client::Page::empty()));
        mock.expect_list_users()
            .returning(|_, _, _| Ok(crate::client::Page::empty()));

        let (tx, rx) = mpsc::unbounded_channel();
        let services = Services::with_api(Arc::new(mock), tx.clone());
        let mut app = AppState::new(rx, tx, services, None);

        app.handle_event(AppEvent::Action(Action::OpenCollection(Uuid::from_u128(7))));
        app.handle_event(key(KeyCode::Char('/')));
        app.handle_event(key(KeyCode::Char('q')));
        assert!(app.running, "q is search input while the search bar is focused");
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let centered = centered_rect(50, 50, area);
        assert!(centered.x > 0);
        assert!(centered.y > 0);
        assert!(centered.width > 0);
        assert!(centered.height > 0);
        assert!(centered.x + centered.width <= area.width);
        assert!(centered.y + centered.height <= area.height);
    }
}
