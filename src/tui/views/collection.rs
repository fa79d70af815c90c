//! Collection detail view — documents and users of one collection.
//!
//! Both tables load progressively in the background and render as soon as
//! the first page lands. Document rows can be filtered by pipeline status,
//! searched by title or id, sorted, multi-selected, inspected, and removed.
//! Every mutation funnels through the view's event channel and is applied
//! on tick, so rendering never blocks on the backend.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::super::theme;
use super::collections::{short_id, truncate};
use super::switcher::centered_fixed;
use crate::client::{
    ApiResult, Collection, CollectionId, CollectionUpdate, DocumentDetail, DocumentId,
    DocumentSummary, ExtractionStatus, IngestionStatus, ItemKind, UserSummary,
};
use crate::state::filter::{EXTRACTION_FIELD, INGESTION_FIELD};
use crate::state::{
    spawn_page_loader, visible_documents, DocumentFilters, LoadOutcome, ResourceList, Selection,
    SortSpec, FETCH_PAGE_SIZE,
};
use crate::tui::events::NotificationLevel;
use crate::tui::services::Services;
use crate::tui::widgets::InputBuffer;

/// Rows shown per table page.
const ITEMS_PER_PAGE: usize = 10;

/// Total checkbox rows in the filter panel.
const FILTER_ROWS: usize = IngestionStatus::ALL.len() + ExtractionStatus::ALL.len();

// ── Tabs and focus ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
enum DetailTab {
    Documents,
    Users,
}

impl DetailTab {
    fn label(self) -> &'static str {
        match self {
            Self::Documents => "Documents",
            Self::Users => "Users",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Documents => Self::Users,
            Self::Users => Self::Documents,
        }
    }

    fn prev(self) -> Self {
        self.next()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum FocusZone {
    List,
    Search,
    Filters,
}

// ── Modals ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
enum ManageField {
    Name,
    Description,
}

impl ManageField {
    fn toggle(self) -> Self {
        match self {
            Self::Name => Self::Description,
            Self::Description => Self::Name,
        }
    }
}

enum DetailModal {
    /// Full document record; `detail` is None while the fetch is in flight.
    DocumentInfo {
        id: DocumentId,
        title: String,
        detail: Option<DocumentDetail>,
        error: Option<String>,
    },
    /// Edit form for collection name and description.
    Manage {
        field: ManageField,
        name: InputBuffer,
        description: InputBuffer,
        error: Option<String>,
        saving: bool,
    },
    /// Destructive-action confirmation for one or many memberships.
    ConfirmRemove {
        kind: ItemKind,
        ids: Vec<Uuid>,
        label: String,
    },
}

// ── Events ─────────────────────────────────────────────────────────────────

/// Results of background work, stamped so responses for a collection the
/// operator has already left are dropped instead of applied.
enum DetailEvent {
    Meta {
        binding: u64,
        result: ApiResult<Collection>,
    },
    Saved {
        binding: u64,
        result: ApiResult<Collection>,
    },
    Removed {
        binding: u64,
        kind: ItemKind,
        removed: usize,
        failed: usize,
        last_error: Option<String>,
    },
    Detail {
        id: DocumentId,
        result: ApiResult<DocumentDetail>,
    },
}

/// Outcome of handling a key, for app-level routing.
#[derive(Debug, PartialEq, Eq)]
pub enum DetailResult {
    Consumed,
    NotHandled,
    Back,
}

// ── State ──────────────────────────────────────────────────────────────────

pub struct CollectionViewState {
    collection_id: Option<CollectionId>,
    /// Bumped every time the view is bound to a collection; stale events
    /// carry an older value and are discarded.
    binding: u64,
    collection: Option<Collection>,
    meta_loading: bool,
    /// Blocking error: the collection itself could not be fetched.
    error: Option<String>,

    documents: ResourceList<DocumentSummary>,
    users: ResourceList<UserSummary>,

    filters: DocumentFilters,
    filter_cursor: usize,
    search: InputBuffer,
    sort: SortSpec,
    selection: Selection,
    /// Indices into `documents` after filter, search, and sort.
    visible: Vec<usize>,

    tab: DetailTab,
    doc_cursor: usize,
    user_cursor: usize,
    focus: FocusZone,
    modal: Option<DetailModal>,

    events_rx: mpsc::UnboundedReceiver<DetailEvent>,
    events_tx: mpsc::UnboundedSender<DetailEvent>,
}

impl CollectionViewState {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            collection_id: None,
            binding: 0,
            collection: None,
            meta_loading: false,
            error: None,
            documents: ResourceList::new(),
            users: ResourceList::new(),
            filters: DocumentFilters::new(),
            filter_cursor: 0,
            search: InputBuffer::new(),
            sort: SortSpec::default(),
            selection: Selection::new(),
            visible: Vec::new(),
            tab: DetailTab::Documents,
            doc_cursor: 0,
            user_cursor: 0,
            focus: FocusZone::List,
            modal: None,
            events_rx,
            events_tx,
        }
    }

    pub fn collection_id(&self) -> Option<CollectionId> {
        self.collection_id
    }

    /// Bind the view to a collection and kick off all three fetches. Resets
    /// every piece of per-collection state, including filters and selection.
    pub fn open_collection(&mut self, id: CollectionId, services: &Services) {
        log::info!("opening collection {}", id);
        self.binding += 1;
        self.collection_id = Some(id);
        self.collection = None;
        self.meta_loading = true;
        self.error = None;
        self.documents.reset();
        self.users.reset();
        self.filters = DocumentFilters::new();
        self.filter_cursor = 0;
        self.search.clear();
        self.sort = SortSpec::default();
        self.selection.clear();
        self.visible.clear();
        self.tab = DetailTab::Documents;
        self.doc_cursor = 0;
        self.user_cursor = 0;
        self.focus = FocusZone::List;
        self.modal = None;

        self.fetch_meta(id, services);
        self.load_documents(id, services);
        self.load_users(id, services);
    }

    /// Reload both tables. The selection is cleared because row identity
    /// may change under it.
    pub fn refetch(&mut self, services: &Services) {
        let Some(id) = self.collection_id else {
            return;
        };
        self.selection.clear();
        self.load_documents(id, services);
        self.load_users(id, services);
    }

    fn fetch_meta(&self, id: CollectionId, services: &Services) {
        let binding = self.binding;
        let tx = self.events_tx.clone();
        let api = services.api.clone();
        tokio::spawn(async move {
            let result = api.retrieve_collection(id).await;
            let _ = tx.send(DetailEvent::Meta { binding, result });
        });
    }

    fn load_documents(&mut self, id: CollectionId, services: &Services) {
        let handle = self.documents.begin_load();
        let api = services.api.clone();
        spawn_page_loader("documents", handle, move |offset| {
            let api = api.clone();
            async move { api.list_documents(id, offset, FETCH_PAGE_SIZE).await }
        });
    }

    fn load_users(&mut self, id: CollectionId, services: &Services) {
        let handle = self.users.begin_load();
        let api = services.api.clone();
        spawn_page_loader("users", handle, move |offset| {
            let api = api.clone();
            async move { api.list_users(id, offset, FETCH_PAGE_SIZE).await }
        });
    }

    // ── Tick ───────────────────────────────────────────────────────────────

    pub fn poll(&mut self, services: &Services) {
        if self.documents.poll() {
            self.rebuild_visible();
        }
        if self.users.poll() && self.user_cursor >= self.users.len() {
            self.user_cursor = self.users.len().saturating_sub(1);
        }
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event, services);
        }
    }

    fn apply_event(&mut self, event: DetailEvent, services: &Services) {
        match event {
            DetailEvent::Meta { binding, result } => {
                if binding != self.binding {
                    log::debug!("dropping stale collection metadata");
                    return;
                }
                self.meta_loading = false;
                match result {
                    Ok(collection) => {
                        self.collection = Some(collection);
                        self.error = None;
                    }
                    Err(e) => {
                        log::warn!("collection fetch failed: {}", e);
                        self.error = Some(e.to_string());
                    }
                }
            }
            DetailEvent::Saved { binding, result } => {
                if binding != self.binding {
                    return;
                }
                match result {
                    Ok(collection) => {
                        services.notify(NotificationLevel::Success, "Collection updated");
                        self.collection = Some(collection);
                        self.modal = None;
                    }
                    Err(e) => {
                        log::warn!("collection update failed: {}", e);
                        if let Some(DetailModal::Manage { error, saving, .. }) = &mut self.modal {
                            *saving = false;
                            *error = Some(e.to_string());
                        } else {
                            services
                                .notify(NotificationLevel::Error, format!("Update failed: {e}"));
                        }
                    }
                }
            }
            DetailEvent::Removed { binding, kind, removed, failed, last_error } => {
                if binding != self.binding {
                    log::debug!("dropping stale removal result");
                    return;
                }
                if failed == 0 {
                    let noun = if removed == 1 {
                        kind.as_str().to_string()
                    } else {
                        format!("{}s", kind.as_str())
                    };
                    services.notify(
                        NotificationLevel::Success,
                        format!("Removed {removed} {noun}"),
                    );
                } else {
                    let detail = last_error.unwrap_or_else(|| "unknown error".to_string());
                    services.notify(
                        NotificationLevel::Error,
                        format!("Removed {removed}, {failed} failed: {detail}"),
                    );
                }
                if removed > 0 {
                    self.refetch(services);
                }
            }
            DetailEvent::Detail { id, result } => {
                let Some(DetailModal::DocumentInfo { id: open_id, detail, error, .. }) =
                    &mut self.modal
                else {
                    log::debug!("document detail arrived with no modal open");
                    return;
                };
                if *open_id != id {
                    return;
                }
                match result {
                    Ok(d) => *detail = Some(d),
                    Err(e) => {
                        log::warn!("document fetch failed: {}", e);
                        *error = Some(e.to_string());
                    }
                }
            }
        }
    }

    /// Recompute the filtered, searched, sorted row set.
    fn rebuild_visible(&mut self) {
        self.visible = visible_documents(
            self.documents.items(),
            &self.filters,
            self.search.text(),
            self.sort,
        );
        if self.doc_cursor >= self.visible.len() {
            self.doc_cursor = self.visible.len().saturating_sub(1);
        }
    }

    // ── Input ──────────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> DetailResult {
        let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            modifiers,
            ..
        }) = event
        else {
            return DetailResult::NotHandled;
        };
        let (modifiers, code) = (*modifiers, *code);

        if self.modal.is_some() {
            self.handle_modal_input(modifiers, code, services);
            return DetailResult::Consumed;
        }

        // Blocking error: the page content is gone, only retry and back
        // remain meaningful.
        if self.error.is_some() {
            return match (modifiers, code) {
                (KeyModifiers::NONE, KeyCode::Esc) => DetailResult::Back,
                (KeyModifiers::NONE, KeyCode::Char('r')) => {
                    if let Some(id) = self.collection_id {
                        self.open_collection(id, services);
                    }
                    DetailResult::Consumed
                }
                _ => DetailResult::NotHandled,
            };
        }

        match self.focus {
            FocusZone::Search => {
                self.handle_search_input(modifiers, code);
                DetailResult::Consumed
            }
            FocusZone::Filters => {
                self.handle_filter_input(modifiers, code);
                DetailResult::Consumed
            }
            FocusZone::List => self.handle_list_input(modifiers, code, services),
        }
    }

    fn handle_list_input(
        &mut self,
        modifiers: KeyModifiers,
        code: KeyCode,
        services: &Services,
    ) -> DetailResult {
        match (modifiers, code) {
            (KeyModifiers::NONE, KeyCode::Esc) => DetailResult::Back,
            (KeyModifiers::NONE, KeyCode::Tab) => {
                self.tab = self.tab.next();
                DetailResult::Consumed
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                self.tab = self.tab.prev();
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('/')) if self.tab == DetailTab::Documents => {
                self.focus = FocusZone::Search;
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('f')) if self.tab == DetailTab::Documents => {
                self.focus = FocusZone::Filters;
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                self.move_cursor(1);
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.move_cursor(-1);
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('g') | KeyCode::Home) => {
                self.set_cursor(0);
                DetailResult::Consumed
            }
            (KeyModifiers::SHIFT, KeyCode::Char('G')) | (KeyModifiers::NONE, KeyCode::End) => {
                self.set_cursor(usize::MAX);
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown) => {
                self.move_cursor(ITEMS_PER_PAGE as isize);
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp) => {
                self.move_cursor(-(ITEMS_PER_PAGE as isize));
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char(' ')) if self.tab == DetailTab::Documents => {
                if let Some(doc) = self.doc_at_cursor() {
                    self.selection.toggle(doc.id);
                }
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('a')) if self.tab == DetailTab::Documents => {
                self.toggle_select_all();
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('s')) if self.tab == DetailTab::Documents => {
                self.sort = self.sort.cycle();
                self.doc_cursor = 0;
                self.rebuild_visible();
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('i') | KeyCode::Enter)
                if self.tab == DetailTab::Documents =>
            {
                self.open_document_info(services);
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('m')) => {
                self.open_manage();
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('x')) => {
                self.confirm_remove_at_cursor();
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('d')) if self.tab == DetailTab::Documents => {
                self.confirm_bulk_remove(services);
                DetailResult::Consumed
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) => {
                self.refetch(services);
                DetailResult::Consumed
            }
            _ => DetailResult::NotHandled,
        }
    }

    fn handle_search_input(&mut self, modifiers: KeyModifiers, code: KeyCode) {
        match (modifiers, code) {
            (KeyModifiers::NONE, KeyCode::Esc) => {
                self.search.clear();
                self.doc_cursor = 0;
                self.rebuild_visible();
                self.focus = FocusZone::List;
            }
            (KeyModifiers::NONE, KeyCode::Enter) => {
                self.focus = FocusZone::List;
            }
            (KeyModifiers::NONE, KeyCode::Backspace) => {
                self.search.backspace();
                self.doc_cursor = 0;
                self.rebuild_visible();
            }
            (KeyModifiers::NONE, KeyCode::Delete) => {
                self.search.delete();
                self.doc_cursor = 0;
                self.rebuild_visible();
            }
            (KeyModifiers::NONE, KeyCode::Left) => self.search.move_left(),
            (KeyModifiers::NONE, KeyCode::Right) => self.search.move_right(),
            (KeyModifiers::NONE, KeyCode::Home) => self.search.move_home(),
            (KeyModifiers::NONE, KeyCode::End) => self.search.move_end(),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                self.search.insert_char(c);
                self.doc_cursor = 0;
                self.rebuild_visible();
            }
            _ => {}
        }
    }

    fn handle_filter_input(&mut self, modifiers: KeyModifiers, code: KeyCode) {
        match (modifiers, code) {
            (KeyModifiers::NONE, KeyCode::Esc | KeyCode::Char('f')) => {
                self.focus = FocusZone::List;
            }
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                if self.filter_cursor + 1 < FILTER_ROWS {
                    self.filter_cursor += 1;
                }
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.filter_cursor = self.filter_cursor.saturating_sub(1);
            }
            (KeyModifiers::NONE, KeyCode::Char(' ') | KeyCode::Enter) => {
                let (field, value) = filter_row(self.filter_cursor);
                self.filters.toggle(field, value);
                self.doc_cursor = 0;
                self.rebuild_visible();
            }
            _ => {}
        }
    }

    fn handle_modal_input(
        &mut self,
        modifiers: KeyModifiers,
        code: KeyCode,
        services: &Services,
    ) {
        match self.modal.take() {
            None => {}
            Some(DetailModal::DocumentInfo { id, title, detail, error }) => {
                if !matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                    self.modal = Some(DetailModal::DocumentInfo { id, title, detail, error });
                }
            }
            Some(DetailModal::ConfirmRemove { kind, ids, label }) => match code {
                KeyCode::Enter | KeyCode::Char('y') => {
                    self.spawn_remove(kind, ids, services);
                }
                KeyCode::Esc | KeyCode::Char('n') => {}
                _ => {
                    self.modal = Some(DetailModal::ConfirmRemove { kind, ids, label });
                }
            },
            Some(DetailModal::Manage { mut field, mut name, mut description, mut error, saving }) => {
                let mut keep = true;
                match (modifiers, code) {
                    (KeyModifiers::NONE, KeyCode::Esc) => keep = false,
                    (KeyModifiers::NONE, KeyCode::Tab | KeyCode::Down)
                    | (KeyModifiers::SHIFT, KeyCode::BackTab)
                    | (KeyModifiers::NONE, KeyCode::Up) => {
                        field = field.toggle();
                    }
                    (KeyModifiers::NONE, KeyCode::Enter) => {
                        if !saving {
                            if name.is_empty() {
                                error = Some("Name cannot be empty".to_string());
                            } else {
                                self.spawn_save(
                                    name.text().trim().to_string(),
                                    description.text().trim().to_string(),
                                    services,
                                );
                                self.modal = Some(DetailModal::Manage {
                                    field,
                                    name,
                                    description,
                                    error: None,
                                    saving: true,
                                });
                                return;
                            }
                        }
                    }
                    (KeyModifiers::NONE, KeyCode::Backspace) => {
                        active_field(&mut name, &mut description, field).backspace();
                        error = None;
                    }
                    (KeyModifiers::NONE, KeyCode::Delete) => {
                        active_field(&mut name, &mut description, field).delete();
                    }
                    (KeyModifiers::NONE, KeyCode::Left) => {
                        active_field(&mut name, &mut description, field).move_left();
                    }
                    (KeyModifiers::NONE, KeyCode::Right) => {
                        active_field(&mut name, &mut description, field).move_right();
                    }
                    (KeyModifiers::NONE, KeyCode::Home) => {
                        active_field(&mut name, &mut description, field).move_home();
                    }
                    (KeyModifiers::NONE, KeyCode::End) => {
                        active_field(&mut name, &mut description, field).move_end();
                    }
                    (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => {
                        active_field(&mut name, &mut description, field).insert_char(c);
                        error = None;
                    }
                    _ => {}
                }
                if keep {
                    self.modal = Some(DetailModal::Manage { field, name, description, error, saving });
                }
            }
        }
    }

    // ── Cursor and selection ───────────────────────────────────────────────

    fn row_count(&self) -> usize {
        match self.tab {
            DetailTab::Documents => self.visible.len(),
            DetailTab::Users => self.users.len(),
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let cursor = match self.tab {
            DetailTab::Documents => &mut self.doc_cursor,
            DetailTab::Users => &mut self.user_cursor,
        };
        let next = cursor.saturating_add_signed(delta);
        *cursor = next.min(len - 1);
    }

    fn set_cursor(&mut self, position: usize) {
        let len = self.row_count();
        let cursor = match self.tab {
            DetailTab::Documents => &mut self.doc_cursor,
            DetailTab::Users => &mut self.user_cursor,
        };
        *cursor = position.min(len.saturating_sub(1));
    }

    fn doc_at_cursor(&self) -> Option<&DocumentSummary> {
        let idx = *self.visible.get(self.doc_cursor)?;
        self.documents.items().get(idx)
    }

    /// Select every visible row, across all pages; if they are already all
    /// selected, clear the selection instead.
    fn toggle_select_all(&mut self) {
        let ids: Vec<Uuid> = self
            .visible
            .iter()
            .map(|&i| self.documents.items()[i].id)
            .collect();
        if ids.is_empty() {
            return;
        }
        if self.selection.contains_all(ids.iter()) {
            self.selection.clear();
        } else {
            self.selection.select_all(ids);
        }
    }

    // ── Actions ────────────────────────────────────────────────────────────

    fn open_document_info(&mut self, services: &Services) {
        let Some(doc) = self.doc_at_cursor() else {
            return;
        };
        if !doc.ingestion_status.is_inspectable() {
            services.notify(
                NotificationLevel::Info,
                "Document has no chunks to inspect yet",
            );
            return;
        }
        let id = doc.id;
        let title = doc.display_title().to_string();
        self.modal = Some(DetailModal::DocumentInfo {
            id,
            title,
            detail: None,
            error: None,
        });

        let tx = self.events_tx.clone();
        let api = services.api.clone();
        tokio::spawn(async move {
            let result = api.retrieve_document(id).await;
            let _ = tx.send(DetailEvent::Detail { id, result });
        });
    }

    fn open_manage(&mut self) {
        let Some(collection) = &self.collection else {
            return;
        };
        self.modal = Some(DetailModal::Manage {
            field: ManageField::Name,
            name: InputBuffer::with_text(collection.name.clone()),
            description: InputBuffer::with_text(
                collection.description.clone().unwrap_or_default(),
            ),
            error: None,
            saving: false,
        });
    }

    fn confirm_remove_at_cursor(&mut self) {
        match self.tab {
            DetailTab::Documents => {
                let Some(doc) = self.doc_at_cursor() else {
                    return;
                };
                self.modal = Some(DetailModal::ConfirmRemove {
                    kind: ItemKind::Document,
                    ids: vec![doc.id],
                    label: doc.display_title().to_string(),
                });
            }
            DetailTab::Users => {
                let Some(user) = self.users.items().get(self.user_cursor) else {
                    return;
                };
                self.modal = Some(DetailModal::ConfirmRemove {
                    kind: ItemKind::User,
                    ids: vec![user.id],
                    label: user.email.clone(),
                });
            }
        }
    }

    fn confirm_bulk_remove(&mut self, services: &Services) {
        if self.selection.is_empty() {
            services.notify(NotificationLevel::Info, "No documents selected");
            return;
        }
        let ids = self.selection.ids_sorted();
        let label = format!("{} selected documents", ids.len());
        self.modal = Some(DetailModal::ConfirmRemove {
            kind: ItemKind::Document,
            ids,
            label,
        });
    }

    fn spawn_save(&self, name: String, description: String, services: &Services) {
        let Some(id) = self.collection_id else {
            return;
        };
        let binding = self.binding;
        let tx = self.events_tx.clone();
        let api = services.api.clone();
        let update = CollectionUpdate {
            name: Some(name),
            description: Some(description),
        };
        tokio::spawn(async move {
            let result = api.update_collection(id, update).await;
            let _ = tx.send(DetailEvent::Saved { binding, result });
        });
    }

    /// Remove memberships one at a time and report a single summary. Order
    /// is deterministic so partial failures are reproducible.
    fn spawn_remove(&self, kind: ItemKind, ids: Vec<Uuid>, services: &Services) {
        let Some(collection_id) = self.collection_id else {
            return;
        };
        let binding = self.binding;
        let tx = self.events_tx.clone();
        let api = services.api.clone();
        tokio::spawn(async move {
            let mut removed = 0usize;
            let mut failed = 0usize;
            let mut last_error = None;
            for id in ids {
                match api.remove_item(collection_id, id, kind).await {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        log::warn!("failed to remove {} {}: {}", kind, id, e);
                        failed += 1;
                        last_error = Some(e.to_string());
                    }
                }
            }
            let _ = tx.send(DetailEvent::Removed {
                binding,
                kind,
                removed,
                failed,
                last_error,
            });
        });
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if self.collection_id.is_none() {
            let block = theme::block_default("Collection");
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    " No collection selected — press o to open one",
                    theme::muted(),
                ))),
                inner,
            );
            return;
        }

        if let Some(error) = &self.error {
            self.render_error(frame, area, error);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.render_tabs(frame, chunks[1]);
        match self.tab {
            DetailTab::Documents => self.render_documents(frame, chunks[2]),
            DetailTab::Users => self.render_users(frame, chunks[2]),
        }

        match &self.modal {
            Some(DetailModal::DocumentInfo { title, detail, error, .. }) => {
                self.render_document_info(frame, area, title, detail.as_ref(), error.as_deref());
            }
            Some(DetailModal::Manage { field, name, description, error, saving }) => {
                self.render_manage(
                    frame,
                    area,
                    *field,
                    name,
                    description,
                    error.as_deref(),
                    *saving,
                );
            }
            Some(DetailModal::ConfirmRemove { kind, ids, label }) => {
                self.render_confirm_remove(frame, area, *kind, ids.len(), label);
            }
            None => {}
        }
    }

    fn render_error(&self, frame: &mut Frame, area: Rect, error: &str) {
        let modal_area = centered_fixed(62, 9, area);
        let block = Block::default()
            .title(" Error ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ERROR));

        let lines = vec![
            Line::raw(""),
            Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    "Failed to load collection",
                    Style::default().fg(theme::ERROR),
                ),
            ]),
            Line::from(vec![
                Span::raw("  "),
                Span::styled(truncate(error, 56), theme::muted()),
            ]),
            Line::raw(""),
            Line::from(vec![
                Span::raw("  "),
                Span::styled("r", theme::key_hint()),
                Span::raw(":retry  "),
                Span::styled("Esc", theme::key_hint()),
                Span::raw(":back to collections"),
            ]),
        ];

        frame.render_widget(Clear, modal_area);
        frame.render_widget(Paragraph::new(lines).block(block), modal_area);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let block = theme::block_default("Collection");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line<'static>> = Vec::with_capacity(3);
        match &self.collection {
            Some(collection) => {
                lines.push(Line::from(vec![
                    Span::raw(" "),
                    Span::styled(collection.name.clone(), theme::title()),
                    Span::raw("  "),
                    Span::styled(collection.id.to_string(), theme::dim()),
                ]));
                let description = collection
                    .description
                    .clone()
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| "No description".to_string());
                lines.push(Line::from(vec![
                    Span::raw(" "),
                    Span::styled(truncate(&description, 90), theme::muted()),
                ]));
                lines.push(Line::from(vec![
                    Span::raw(" "),
                    Span::styled(
                        format!(
                            "{} documents • {} users • updated {}",
                            self.documents.total_entries(),
                            self.users.total_entries(),
                            collection.updated_at.format("%Y-%m-%d %H:%M"),
                        ),
                        theme::dim(),
                    ),
                    Span::raw("  "),
                    Span::styled("m", theme::key_hint()),
                    Span::raw(":manage"),
                ]));
            }
            None if self.meta_loading => {
                lines.push(Line::from(Span::styled(
                    " Loading collection...",
                    theme::muted(),
                )));
            }
            None => {
                lines.push(Line::from(Span::styled(" Collection", theme::muted())));
            }
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let tabs = [DetailTab::Documents, DetailTab::Users];
        let spans: Vec<Span> = tabs
            .iter()
            .flat_map(|t| {
                let count = match t {
                    DetailTab::Documents => self.documents.total_entries(),
                    DetailTab::Users => self.users.total_entries(),
                };
                let style = if *t == self.tab {
                    theme::highlight()
                } else {
                    theme::muted()
                };
                vec![
                    Span::styled(format!(" {} ({}) ", t.label(), count), style),
                    Span::raw("│"),
                ]
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new(Line::from(spans)), inner);
    }

    fn render_documents(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(26), Constraint::Min(0)])
            .split(area);

        self.render_filter_panel(frame, columns[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(columns[1]);

        self.render_search(frame, rows[0]);
        self.render_document_table(frame, rows[1]);
    }

    fn render_search(&self, frame: &mut Frame, area: Rect) {
        let block = if self.focus == FocusZone::Search {
            theme::block_focused("Search")
        } else {
            theme::block_default("Search")
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let line = if self.focus == FocusZone::Search {
            Line::from(vec![
                Span::styled(" EDIT ", theme::mode_badge()),
                Span::raw(" "),
                Span::styled(
                    format!("{}█", self.search.text()),
                    Style::default().fg(theme::TEXT),
                ),
            ])
        } else if self.search.text().is_empty() {
            Line::from(vec![
                Span::raw(" "),
                Span::styled("press / to search title or id", theme::dim()),
            ])
        } else {
            Line::from(vec![
                Span::raw(" "),
                Span::styled(self.search.text().to_string(), Style::default().fg(theme::TEXT)),
            ])
        };
        frame.render_widget(Paragraph::new(line), inner);
    }

    fn render_filter_panel(&self, frame: &mut Frame, area: Rect) {
        let block = if self.focus == FocusZone::Filters {
            theme::block_focused("Filters")
        } else {
            theme::block_default("Filters")
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line<'static>> = Vec::with_capacity(FILTER_ROWS + 4);
        lines.push(Line::from(Span::styled(" INGESTION", theme::heading())));
        for (row, status) in IngestionStatus::ALL.iter().enumerate() {
            lines.push(self.filter_line(row, INGESTION_FIELD, status.as_str()));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(" EXTRACTION", theme::heading())));
        for (offset, status) in ExtractionStatus::ALL.iter().enumerate() {
            let row = IngestionStatus::ALL.len() + offset;
            lines.push(self.filter_line(row, EXTRACTION_FIELD, status.as_str()));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw(" "),
            Span::styled("f", theme::key_hint()),
            Span::raw(":focus "),
            Span::styled("space", theme::key_hint()),
            Span::raw(":toggle"),
        ]));

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn filter_line(&self, row: usize, field: &str, value: &str) -> Line<'static> {
        let mark = if self.filters.accepts(field, value) {
            "[x]"
        } else {
            "[ ]"
        };
        let pointer = if self.focus == FocusZone::Filters && self.filter_cursor == row {
            "▸"
        } else {
            " "
        };
        let style = if self.focus == FocusZone::Filters && self.filter_cursor == row {
            theme::highlight()
        } else {
            Style::default().fg(theme::TEXT)
        };
        Line::from(vec![
            Span::raw(format!("{pointer} ")),
            Span::styled(format!("{mark} {value}"), style),
        ])
    }

    fn render_document_table(&self, frame: &mut Frame, area: Rect) {
        let block = if self.focus == FocusZone::List && self.tab == DetailTab::Documents {
            theme::block_focused("Documents")
        } else {
            theme::block_default("Documents")
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.documents.outcome() == Some(LoadOutcome::Failed) && self.documents.is_empty() {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::raw(""),
                    Line::from(Span::styled(
                        " Failed to load documents",
                        Style::default().fg(theme::ERROR),
                    )),
                    Line::from(Span::styled(" Press r to retry", theme::muted())),
                ]),
                inner,
            );
            return;
        }

        if self.documents.is_loading() && self.documents.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    " Loading documents...",
                    theme::muted(),
                ))),
                inner,
            );
            return;
        }

        let mut lines: Vec<Line<'static>> = Vec::with_capacity(ITEMS_PER_PAGE + 3);
        lines.push(self.document_summary_line());

        if self.visible.is_empty() {
            let message = if self.documents.is_empty() {
                " No documents in this collection"
            } else {
                " No documents match the current filters"
            };
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(message, theme::muted())));
            frame.render_widget(Paragraph::new(lines), inner);
            return;
        }

        lines.push(Line::from(Span::styled(
            format!(
                "     {:<32} {:<10} {:<10} {:<10} CREATED",
                "TITLE", "ID", "INGEST", "EXTRACT"
            ),
            theme::heading(),
        )));

        let page = self.doc_cursor / ITEMS_PER_PAGE;
        let start = page * ITEMS_PER_PAGE;
        let end = (start + ITEMS_PER_PAGE).min(self.visible.len());

        for position in start..end {
            let doc = &self.documents.items()[self.visible[position]];
            let checked = if self.selection.contains(doc.id) {
                "[x]"
            } else {
                "[ ]"
            };
            let pointer = if position == self.doc_cursor { "▸" } else { " " };
            let line = Line::from(vec![
                Span::raw(format!("{pointer}{checked} ")),
                Span::styled(
                    format!("{:<33}", truncate(doc.display_title(), 32)),
                    Style::default().fg(theme::TEXT),
                ),
                Span::styled(format!("{:<11}", short_id(doc.id)), theme::dim()),
                Span::styled(
                    format!("{:<11}", doc.ingestion_status.as_str()),
                    Style::default().fg(ingestion_color(doc.ingestion_status)),
                ),
                Span::styled(
                    format!("{:<11}", doc.extraction_status.as_str()),
                    Style::default().fg(extraction_color(doc.extraction_status)),
                ),
                Span::styled(
                    doc.created_at.format("%Y-%m-%d").to_string(),
                    theme::muted(),
                ),
            ]);
            if position == self.doc_cursor {
                lines.push(line.style(theme::row_cursor()));
            } else {
                lines.push(line);
            }
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn document_summary_line(&self) -> Line<'static> {
        let pages = self.visible.len().div_ceil(ITEMS_PER_PAGE).max(1);
        let page = self.doc_cursor / ITEMS_PER_PAGE + 1;
        let mut spans = vec![Span::styled(
            format!(
                " {} of {} shown • page {}/{} • {} selected • sort: {}",
                self.visible.len(),
                self.documents.total_entries(),
                page,
                pages,
                self.selection.len(),
                self.sort.label(),
            ),
            theme::muted(),
        )];
        if let Some(flag) = list_status(self.documents.is_loading(), self.documents.outcome()) {
            spans.push(flag);
        }
        Line::from(spans)
    }

    fn render_users(&self, frame: &mut Frame, area: Rect) {
        let block = if self.focus == FocusZone::List && self.tab == DetailTab::Users {
            theme::block_focused("Users")
        } else {
            theme::block_default("Users")
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.users.outcome() == Some(LoadOutcome::Failed) && self.users.is_empty() {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::raw(""),
                    Line::from(Span::styled(
                        " Failed to load users",
                        Style::default().fg(theme::ERROR),
                    )),
                    Line::from(Span::styled(" Press r to retry", theme::muted())),
                ]),
                inner,
            );
            return;
        }

        if self.users.is_loading() && self.users.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(" Loading users...", theme::muted()))),
                inner,
            );
            return;
        }

        let mut lines: Vec<Line<'static>> = Vec::with_capacity(ITEMS_PER_PAGE + 3);
        let pages = self.users.len().div_ceil(ITEMS_PER_PAGE).max(1);
        let page = self.user_cursor / ITEMS_PER_PAGE + 1;
        let mut spans = vec![Span::styled(
            format!(
                " {} users • page {}/{}",
                self.users.total_entries(),
                page,
                pages
            ),
            theme::muted(),
        )];
        if let Some(flag) = list_status(self.users.is_loading(), self.users.outcome()) {
            spans.push(flag);
        }
        lines.push(Line::from(spans));

        if self.users.is_empty() {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                " No users have access to this collection",
                theme::muted(),
            )));
            frame.render_widget(Paragraph::new(lines), inner);
            return;
        }

        lines.push(Line::from(Span::styled(
            format!("   {:<36} {:<10} FLAGS", "EMAIL", "ID"),
            theme::heading(),
        )));

        let start = (self.user_cursor / ITEMS_PER_PAGE) * ITEMS_PER_PAGE;
        let end = (start + ITEMS_PER_PAGE).min(self.users.len());
        for position in start..end {
            let user = &self.users.items()[position];
            let pointer = if position == self.user_cursor { "▸ " } else { "  " };
            let mut flags: Vec<&str> = Vec::new();
            if user.is_superuser {
                flags.push("admin");
            }
            if !user.is_active {
                flags.push("inactive");
            }
            if !user.is_verified {
                flags.push("unverified");
            }
            let line = Line::from(vec![
                Span::raw(pointer.to_string()),
                Span::styled(
                    format!("{:<37}", truncate(&user.email, 36)),
                    Style::default().fg(theme::TEXT),
                ),
                Span::styled(format!("{:<11}", short_id(user.id)), theme::dim()),
                Span::styled(flags.join(", "), theme::muted()),
            ]);
            if position == self.user_cursor {
                lines.push(line.style(theme::row_cursor()));
            } else {
                lines.push(line);
            }
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_document_info(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        detail: Option<&DocumentDetail>,
        error: Option<&str>,
    ) {
        let modal_area = centered_fixed(66, 17, area);
        let block = Block::default()
            .title(format!(" {} ", truncate(title, 56)))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(theme::border_focused());

        let mut lines: Vec<Line<'static>> = vec![Line::raw("")];

        if let Some(error) = error {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled("Failed to load document", Style::default().fg(theme::ERROR)),
            ]));
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(truncate(error, 58), theme::muted()),
            ]));
        } else if let Some(detail) = detail {
            let row = |label: &str, value: String| {
                Line::from(vec![
                    Span::styled(format!("  {:<12}", label), theme::muted()),
                    Span::styled(value, Style::default().fg(theme::TEXT)),
                ])
            };
            lines.push(row("Id", detail.id.to_string()));
            lines.push(row(
                "Type",
                detail.document_type.clone().unwrap_or_else(|| "-".into()),
            ));
            lines.push(row(
                "Version",
                detail.version.clone().unwrap_or_else(|| "-".into()),
            ));
            lines.push(row(
                "Size",
                detail.size_in_bytes.map(human_size).unwrap_or_else(|| "-".into()),
            ));
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<12}", "Ingestion"), theme::muted()),
                Span::styled(
                    detail.ingestion_status.as_str().to_string(),
                    Style::default().fg(ingestion_color(detail.ingestion_status)),
                ),
            ]));
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<12}", "Extraction"), theme::muted()),
                Span::styled(
                    detail.extraction_status.as_str().to_string(),
                    Style::default().fg(extraction_color(detail.extraction_status)),
                ),
            ]));
            lines.push(row(
                "Created",
                detail.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ));
            lines.push(row(
                "Updated",
                detail.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            ));
            lines.push(row(
                "Collections",
                detail.collection_ids.len().to_string(),
            ));
            if let Some(summary) = detail.summary.as_deref().filter(|s| !s.is_empty()) {
                lines.push(Line::raw(""));
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(truncate(summary, 58), theme::dim()),
                ]));
            }
        } else {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled("Loading document...", theme::muted()),
            ]));
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled("Esc", theme::key_hint()),
            Span::raw(":close"),
        ]));

        frame.render_widget(Clear, modal_area);
        frame.render_widget(Paragraph::new(lines).block(block), modal_area);
    }

    #[allow(clippy::too_many_arguments)]
    fn render_manage(
        &self,
        frame: &mut Frame,
        area: Rect,
        field: ManageField,
        name: &InputBuffer,
        description: &InputBuffer,
        error: Option<&str>,
        saving: bool,
    ) {
        let modal_area = centered_fixed(60, 11, area);
        let block = Block::default()
            .title(" Manage Collection ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(theme::border_focused());

        let input_line = |label: &str, buffer: &InputBuffer, active: bool| {
            let pointer = if active { "▸" } else { " " };
            let text = if active {
                format!("{}█", buffer.text())
            } else {
                buffer.text().to_string()
            };
            Line::from(vec![
                Span::raw(format!(" {pointer} ")),
                Span::styled(format!("{:<13}", label), theme::muted()),
                Span::styled(text, Style::default().fg(theme::TEXT)),
            ])
        };

        let mut lines = vec![
            Line::raw(""),
            input_line("Name", name, field == ManageField::Name),
            Line::raw(""),
            input_line("Description", description, field == ManageField::Description),
            Line::raw(""),
        ];

        if let Some(error) = error {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(truncate(error, 52), Style::default().fg(theme::ERROR)),
            ]));
        } else if saving {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled("Saving...", Style::default().fg(theme::WARNING)),
            ]));
        } else {
            lines.push(Line::raw(""));
        }

        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled("Tab", theme::key_hint()),
            Span::raw(":field  "),
            Span::styled("Enter", theme::key_hint()),
            Span::raw(":save  "),
            Span::styled("Esc", theme::key_hint()),
            Span::raw(":cancel"),
        ]));

        frame.render_widget(Clear, modal_area);
        frame.render_widget(Paragraph::new(lines).block(block), modal_area);
    }

    fn render_confirm_remove(
        &self,
        frame: &mut Frame,
        area: Rect,
        kind: ItemKind,
        count: usize,
        label: &str,
    ) {
        let modal_area = centered_fixed(58, 8, area);
        let block = Block::default()
            .title(" Confirm Removal ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ERROR));

        let noun = if count == 1 {
            kind.as_str().to_string()
        } else {
            format!("{}s", kind.as_str())
        };
        let lines = vec![
            Line::raw(""),
            Line::from(vec![
                Span::raw("  Remove "),
                Span::styled(truncate(label, 40), theme::highlight()),
                Span::raw(" from this collection?"),
            ]),
            Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    format!("The underlying {noun} will not be deleted."),
                    theme::muted(),
                ),
            ]),
            Line::raw(""),
            Line::from(vec![
                Span::raw("  "),
                Span::styled("Enter", theme::key_hint()),
                Span::raw(":remove  "),
                Span::styled("Esc", theme::key_hint()),
                Span::raw(":cancel"),
            ]),
        ];

        frame.render_widget(Clear, modal_area);
        frame.render_widget(Paragraph::new(lines).block(block), modal_area);
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Map a filter-panel row index to its (field, value) pair.
fn filter_row(row: usize) -> (&'static str, &'static str) {
    if row < IngestionStatus::ALL.len() {
        (INGESTION_FIELD, IngestionStatus::ALL[row].as_str())
    } else {
        (
            EXTRACTION_FIELD,
            ExtractionStatus::ALL[row - IngestionStatus::ALL.len()].as_str(),
        )
    }
}

fn active_field<'a>(
    name: &'a mut InputBuffer,
    description: &'a mut InputBuffer,
    field: ManageField,
) -> &'a mut InputBuffer {
    match field {
        ManageField::Name => name,
        ManageField::Description => description,
    }
}

fn ingestion_color(status: IngestionStatus) -> Color {
    match status {
        IngestionStatus::Success | IngestionStatus::Enriched => theme::SUCCESS,
        IngestionStatus::Failure => theme::ERROR,
        _ => theme::WARNING,
    }
}

fn extraction_color(status: ExtractionStatus) -> Color {
    match status {
        ExtractionStatus::Success => theme::SUCCESS,
        ExtractionStatus::Failed => theme::ERROR,
        ExtractionStatus::Pending => theme::WARNING,
    }
}

fn list_status(loading: bool, outcome: Option<LoadOutcome>) -> Option<Span<'static>> {
    if loading {
        return Some(Span::styled(
            "  syncing…",
            Style::default().fg(theme::WARNING),
        ));
    }
    match outcome {
        Some(LoadOutcome::Partial) => Some(Span::styled(
            "  partial data",
            Style::default().fg(theme::WARNING),
        )),
        Some(LoadOutcome::Failed) => Some(Span::styled(
            "  load failed",
            Style::default().fg(theme::ERROR),
        )),
        _ => None,
    }
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    match bytes {
        b if b >= GB => format!("{:.1} GiB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1} MiB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KiB", b as f64 / KB as f64),
        b => format!("{b} B"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiError, MockCollectionApi, Page};
    use crate::tui::events::AppEvent;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn ts(day: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    fn doc_row(n: u128, title: &str, status: IngestionStatus) -> DocumentSummary {
        DocumentSummary {
            id: Uuid::from_u128(n),
            title: Some(title.to_string()),
            ingestion_status: status,
            extraction_status: ExtractionStatus::Pending,
            created_at: ts(1),
            updated_at: ts(1),
            metadata: serde_json::Value::Null,
        }
    }

    fn user_row(n: u128, email: &str) -> UserSummary {
        UserSummary {
            id: Uuid::from_u128(n),
            email: email.to_string(),
            is_active: true,
            is_superuser: false,
            is_verified: true,
            created_at: Some(ts(1)),
        }
    }

    fn collection_fixture(id: CollectionId) -> Collection {
        Collection {
            id,
            name: "ops handbook".to_string(),
            description: Some("operational docs".to_string()),
            created_at: ts(1),
            updated_at: ts(2),
        }
    }

    fn detail_fixture(id: DocumentId) -> DocumentDetail {
        DocumentDetail {
            id,
            title: Some("runbook".to_string()),
            document_type: Some("pdf".to_string()),
            version: Some("v1".to_string()),
            size_in_bytes: Some(2048),
            owner_id: None,
            collection_ids: vec![],
            ingestion_status: IngestionStatus::Success,
            extraction_status: ExtractionStatus::Success,
            created_at: ts(1),
            updated_at: ts(1),
            summary: None,
            metadata: serde_json::Value::Null,
        }
    }

    fn services_pair(
        api: impl crate::client::CollectionApi + 'static,
    ) -> (Services, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Services::with_api(Arc::new(api), tx), rx)
    }

    async fn settle(view: &mut CollectionViewState, services: &Services) {
        for _ in 0..64 {
            tokio::task::yield_now().await;
            view.poll(services);
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn notifications(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<(NotificationLevel, String)> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Notification(n) = event {
                out.push((n.level, n.message));
            }
        }
        out
    }

    fn mock_with_docs(docs: Vec<DocumentSummary>, users: Vec<UserSummary>) -> MockCollectionApi {
        let mut mock = MockCollectionApi::new();
        mock.expect_retrieve_collection()
            .returning(|id| Ok(collection_fixture(id)));
        let total = docs.len();
        mock.expect_list_documents().returning(move |_, offset, limit| {
            let slice: Vec<_> = docs.iter().skip(offset).take(limit).cloned().collect();
            Ok(Page { results: slice, total_entries: total })
        });
        let user_total = users.len();
        mock.expect_list_users().returning(move |_, offset, limit| {
            let slice: Vec<_> = users.iter().skip(offset).take(limit).cloned().collect();
            Ok(Page { results: slice, total_entries: user_total })
        });
        mock
    }

    #[tokio::test]
    async fn test_open_collection_populates_both_tables() {
        let docs = vec![
            doc_row(1, "alpha", IngestionStatus::Success),
            doc_row(2, "beta", IngestionStatus::Pending),
            doc_row(3, "gamma", IngestionStatus::Failure),
        ];
        let users = vec![user_row(10, "a@ops.dev"), user_row(11, "b@ops.dev")];
        let (services, _rx) = services_pair(mock_with_docs(docs, users));

        let mut view = CollectionViewState::new();
        view.open_collection(Uuid::from_u128(99), &services);
        settle(&mut view, &services).await;

        assert_eq!(view.collection.as_ref().map(|c| c.name.as_str()), Some("ops handbook"));
        assert_eq!(view.visible.len(), 3);
        assert_eq!(view.users.len(), 2);
        assert_eq!(view.documents.outcome(), Some(LoadOutcome::Complete));
        assert!(!view.documents.is_loading());
    }

    #[tokio::test]
    async fn test_remove_refetches_and_clears_selection() {
        let docs = vec![
            doc_row(1, "alpha", IngestionStatus::Success),
            doc_row(2, "beta", IngestionStatus::Success),
        ];
        let doc_calls = Arc::new(AtomicUsize::new(0));
        let user_calls = Arc::new(AtomicUsize::new(0));

        let mut mock = MockCollectionApi::new();
        mock.expect_retrieve_collection()
            .returning(|id| Ok(collection_fixture(id)));
        {
            let docs = docs.clone();
            let doc_calls = Arc::clone(&doc_calls);
            mock.expect_list_documents().returning(move |_, _, _| {
                doc_calls.fetch_add(1, Ordering::SeqCst);
                Ok(Page { results: docs.clone(), total_entries: docs.len() })
            });
        }
        {
            let user_calls = Arc::clone(&user_calls);
            mock.expect_list_users().returning(move |_, _, _| {
                user_calls.fetch_add(1, Ordering::SeqCst);
                Ok(Page::empty())
            });
        }
        mock.expect_remove_item().returning(|_, _, _| Ok(()));

        let (services, mut rx) = services_pair(mock);
        let mut view = CollectionViewState::new();
        view.open_collection(Uuid::from_u128(99), &services);
        settle(&mut view, &services).await;

        view.handle_input(&key(KeyCode::Char(' ')), &services);
        assert_eq!(view.selection.len(), 1);

        view.handle_input(&key(KeyCode::Char('x')), &services);
        assert!(matches!(view.modal, Some(DetailModal::ConfirmRemove { .. })));
        view.handle_input(&key(KeyCode::Enter), &services);
        assert!(view.modal.is_none());
        settle(&mut view, &services).await;

        assert!(view.selection.is_empty(), "refetch clears the selection");
        assert_eq!(doc_calls.load(Ordering::SeqCst), 2, "documents reloaded once");
        assert_eq!(user_calls.load(Ordering::SeqCst), 2, "users reloaded once");

        let toasts = notifications(&mut rx);
        assert!(toasts
            .iter()
            .any(|(level, msg)| *level == NotificationLevel::Success && msg.contains("Removed 1")));
    }

    #[tokio::test]
    async fn test_select_all_covers_filtered_set_across_pages() {
        let mut docs: Vec<DocumentSummary> = (0..12)
            .map(|n| doc_row(n, &format!("ready {n:02}"), IngestionStatus::Success))
            .collect();
        docs.extend((20..28).map(|n| doc_row(n, &format!("wip {n}"), IngestionStatus::Pending)));
        let (services, _rx) = services_pair(mock_with_docs(docs, vec![]));

        let mut view = CollectionViewState::new();
        view.open_collection(Uuid::from_u128(99), &services);
        settle(&mut view, &services).await;
        assert_eq!(view.visible.len(), 20);

        // Narrow to successfully ingested rows only.
        for status in IngestionStatus::ALL {
            if status != IngestionStatus::Success {
                view.filters.toggle(INGESTION_FIELD, status.as_str());
            }
        }
        view.doc_cursor = 0;
        view.rebuild_visible();
        assert_eq!(view.visible.len(), 12);

        view.handle_input(&key(KeyCode::Char('a')), &services);
        assert_eq!(view.selection.len(), 12, "all filtered rows, not just the visible page");

        view.handle_input(&key(KeyCode::Char('a')), &services);
        assert!(view.selection.is_empty(), "second press clears");
    }

    #[tokio::test]
    async fn test_filter_changes_leave_selection_alone() {
        let docs = vec![
            doc_row(1, "alpha", IngestionStatus::Success),
            doc_row(2, "beta", IngestionStatus::Pending),
        ];
        let (services, _rx) = services_pair(mock_with_docs(docs, vec![]));

        let mut view = CollectionViewState::new();
        view.open_collection(Uuid::from_u128(99), &services);
        settle(&mut view, &services).await;

        view.selection.toggle(Uuid::from_u128(2));
        // Hide the pending row; its selection must survive.
        view.filters.toggle(INGESTION_FIELD, "pending");
        view.doc_cursor = 0;
        view.rebuild_visible();
        assert_eq!(view.visible.len(), 1);
        assert!(view.selection.contains(Uuid::from_u128(2)));
    }

    #[tokio::test]
    async fn test_document_info_gated_on_ingestion_status() {
        let docs = vec![
            doc_row(1, "draft", IngestionStatus::Pending),
            doc_row(2, "ready", IngestionStatus::Success),
        ];
        let mut mock = mock_with_docs(docs, vec![]);
        mock.expect_retrieve_document()
            .returning(|id| Ok(detail_fixture(id)));

        let (services, mut rx) = services_pair(mock);
        let mut view = CollectionViewState::new();
        view.open_collection(Uuid::from_u128(99), &services);
        settle(&mut view, &services).await;

        // Title sort: "draft" before "ready", cursor starts on the pending doc.
        view.handle_input(&key(KeyCode::Enter), &services);
        assert!(view.modal.is_none(), "pending documents cannot be inspected");
        let toasts = notifications(&mut rx);
        assert!(toasts.iter().any(|(level, _)| *level == NotificationLevel::Info));

        view.handle_input(&key(KeyCode::Char('j')), &services);
        view.handle_input(&key(KeyCode::Enter), &services);
        assert!(matches!(view.modal, Some(DetailModal::DocumentInfo { .. })));
        settle(&mut view, &services).await;
        match &view.modal {
            Some(DetailModal::DocumentInfo { detail, error, .. }) => {
                assert!(error.is_none());
                assert!(detail.is_some());
            }
            _ => panic!("expected document info modal"),
        }
    }

    #[tokio::test]
    async fn test_mid_walk_failure_surfaces_partial_outcome() {
        let mut mock = MockCollectionApi::new();
        mock.expect_retrieve_collection()
            .returning(|id| Ok(collection_fixture(id)));
        mock.expect_list_documents().returning(|_, offset, _| {
            if offset == 0 {
                let rows: Vec<_> = (0..100)
                    .map(|n| doc_row(n, &format!("doc {n:03}"), IngestionStatus::Success))
                    .collect();
                Ok(Page { results: rows, total_entries: 250 })
            } else {
                Err(ApiError::api(500, "backend sneeze"))
            }
        });
        mock.expect_list_users().returning(|_, _, _| Ok(Page::empty()));

        let (services, _rx) = services_pair(mock);
        let mut view = CollectionViewState::new();
        view.open_collection(Uuid::from_u128(99), &services);
        settle(&mut view, &services).await;

        assert_eq!(view.documents.len(), 100, "first page kept");
        assert_eq!(view.documents.outcome(), Some(LoadOutcome::Partial));
        assert!(!view.documents.is_loading());
    }

    #[tokio::test]
    async fn test_meta_failure_blocks_page_but_not_global_keys() {
        let mut mock = MockCollectionApi::new();
        mock.expect_retrieve_collection()
            .returning(|_| Err(ApiError::api(500, "metadata store down")));
        mock.expect_list_documents()
            .returning(|_, _, _| Ok(Page::empty()));
        mock.expect_list_users().returning(|_, _, _| Ok(Page::empty()));

        let (services, _rx) = services_pair(mock);
        let mut view = CollectionViewState::new();
        view.open_collection(Uuid::from_u128(99), &services);
        settle(&mut view, &services).await;

        assert!(view.error.is_some());
        // Navigation is dead; unhandled keys fall through to the app.
        assert_eq!(
            view.handle_input(&key(KeyCode::Char('j')), &services),
            DetailResult::NotHandled
        );
        assert_eq!(
            view.handle_input(&key(KeyCode::Esc), &services),
            DetailResult::Back
        );
    }

    // Scripted double with a gate on one collection's document listing, to
    // drive the switch-while-loading race deterministically.
    struct GatedApi {
        slow: CollectionId,
        gate: Arc<tokio::sync::Notify>,
        doc_calls: Arc<Mutex<Vec<(CollectionId, usize)>>>,
    }

    #[async_trait::async_trait]
    impl crate::client::CollectionApi for GatedApi {
        async fn retrieve_collection(&self, id: CollectionId) -> ApiResult<Collection> {
            Ok(collection_fixture(id))
        }

        async fn update_collection(
            &self,
            _id: CollectionId,
            _update: CollectionUpdate,
        ) -> ApiResult<Collection> {
            unimplemented!("not used in this test")
        }

        async fn list_collections(
            &self,
            _offset: usize,
            _limit: usize,
        ) -> ApiResult<Page<Collection>> {
            unimplemented!("not used in this test")
        }

        async fn list_documents(
            &self,
            collection_id: CollectionId,
            offset: usize,
            _limit: usize,
        ) -> ApiResult<Page<DocumentSummary>> {
            self.doc_calls.lock().unwrap().push((collection_id, offset));
            if collection_id == self.slow {
                self.gate.notified().await;
                return Ok(Page {
                    results: vec![doc_row(1, "from the slow collection", IngestionStatus::Success)],
                    total_entries: 1,
                });
            }
            Ok(Page {
                results: vec![doc_row(2, "from the fast collection", IngestionStatus::Success)],
                total_entries: 1,
            })
        }

        async fn list_users(
            &self,
            _collection_id: CollectionId,
            _offset: usize,
            _limit: usize,
        ) -> ApiResult<Page<UserSummary>> {
            Ok(Page::empty())
        }

        async fn retrieve_document(&self, _id: DocumentId) -> ApiResult<DocumentDetail> {
            unimplemented!("not used in this test")
        }

        async fn remove_item(
            &self,
            _collection_id: CollectionId,
            _item_id: Uuid,
            _kind: ItemKind,
        ) -> ApiResult<()> {
            unimplemented!("not used in this test")
        }
    }

    #[tokio::test]
    async fn test_switching_collections_discards_superseded_responses() {
        let slow = Uuid::from_u128(0xA);
        let fast = Uuid::from_u128(0xB);
        let gate = Arc::new(tokio::sync::Notify::new());
        let doc_calls = Arc::new(Mutex::new(Vec::new()));
        let api = GatedApi {
            slow,
            gate: Arc::clone(&gate),
            doc_calls: Arc::clone(&doc_calls),
        };

        let (services, _rx) = services_pair(api);
        let mut view = CollectionViewState::new();

        view.open_collection(slow, &services);
        settle(&mut view, &services).await;
        assert!(view.documents.is_empty(), "slow fetch still parked");

        view.open_collection(fast, &services);
        settle(&mut view, &services).await;
        assert_eq!(view.documents.len(), 1);
        assert_eq!(
            view.documents.items()[0].title.as_deref(),
            Some("from the fast collection")
        );

        // Release the superseded fetch; its rows must not appear.
        gate.notify_one();
        settle(&mut view, &services).await;
        assert_eq!(view.documents.len(), 1);
        assert_eq!(
            view.documents.items()[0].title.as_deref(),
            Some("from the fast collection")
        );
        assert_eq!(view.collection.as_ref().map(|c| c.id), Some(fast));

        let calls = doc_calls.lock().unwrap();
        let slow_calls = calls.iter().filter(|(id, _)| *id == slow).count();
        assert_eq!(slow_calls, 1, "superseded walk stopped after its gated page");
    }

    #[tokio::test]
    async fn test_search_edit_resets_page_cursor() {
        let docs: Vec<DocumentSummary> = (0..25)
            .map(|n| doc_row(n, &format!("doc {n:02}"), IngestionStatus::Success))
            .collect();
        let (services, _rx) = services_pair(mock_with_docs(docs, vec![]));

        let mut view = CollectionViewState::new();
        view.open_collection(Uuid::from_u128(99), &services);
        settle(&mut view, &services).await;

        view.handle_input(&key(KeyCode::End), &services);
        assert_eq!(view.doc_cursor, 24);

        view.handle_input(&key(KeyCode::Char('/')), &services);
        view.handle_input(&key(KeyCode::Char('d')), &services);
        assert_eq!(view.doc_cursor, 0, "typing in search jumps back to page 1");
    }

    #[tokio::test]
    async fn test_manage_save_updates_header() {
        let mut mock = mock_with_docs(vec![], vec![]);
        mock.expect_update_collection().returning(|id, update| {
            let mut collection = collection_fixture(id);
            if let Some(name) = update.name {
                collection.name = name;
            }
            collection.description = update.description;
            Ok(collection)
        });

        let (services, mut rx) = services_pair(mock);
        let mut view = CollectionViewState::new();
        view.open_collection(Uuid::from_u128(99), &services);
        settle(&mut view, &services).await;

        view.handle_input(&key(KeyCode::Char('m')), &services);
        assert!(matches!(view.modal, Some(DetailModal::Manage { .. })));

        // Append to the prefilled name and save.
        view.handle_input(&key(KeyCode::Char('!')), &services);
        view.handle_input(&key(KeyCode::Enter), &services);
        settle(&mut view, &services).await;

        assert!(view.modal.is_none(), "modal closes on successful save");
        assert_eq!(
            view.collection.as_ref().map(|c| c.name.as_str()),
            Some("ops handbook!")
        );
        let toasts = notifications(&mut rx);
        assert!(toasts
            .iter()
            .any(|(level, _)| *level == NotificationLevel::Success));
    }

    #[rstest::rstest]
    #[case(0, "0 B")]
    #[case(512, "512 B")]
    #[case(1024, "1.0 KiB")]
    #[case(1536, "1.5 KiB")]
    #[case(5 * 1024 * 1024, "5.0 MiB")]
    #[case(3 * 1024 * 1024 * 1024, "3.0 GiB")]
    fn test_human_size_units(#[case] bytes: u64, #[case] rendered: &str) {
        assert_eq!(human_size(bytes), rendered);
    }
}
