//! Progressively loaded resource lists.
//!
//! A [`ResourceList`] is the reducer side of a batch load: a background task
//! fetches pages and publishes [`ListEvent`]s over the list's channel, and
//! the UI thread drains them on tick via [`ResourceList::poll`]. Every load
//! gets a fresh generation number from a shared counter; events stamped with
//! an older generation are dropped, so a superseded load can never clobber
//! the one that replaced it, no matter how late its responses arrive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

/// How a finished load ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Every page up to the reported total was fetched.
    Complete,
    /// At least one page arrived, then a later page failed. The fetched
    /// prefix is kept and shown.
    Partial,
    /// The first page failed; nothing was fetched.
    Failed,
}

impl LoadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

/// One step of a progressive load, stamped with its generation.
#[derive(Debug)]
pub enum ListEvent<T> {
    /// First page: replaces the list wholesale and clears the loading flag,
    /// so rows render while later pages are still in flight.
    FirstBatch {
        epoch: u64,
        items: Vec<T>,
        total_entries: usize,
    },
    /// A follow-up page, appended in order.
    MoreItems { epoch: u64, items: Vec<T> },
    /// Load finished, successfully or not.
    Finished { epoch: u64, outcome: LoadOutcome },
}

impl<T> ListEvent<T> {
    fn epoch(&self) -> u64 {
        match self {
            Self::FirstBatch { epoch, .. }
            | Self::MoreItems { epoch, .. }
            | Self::Finished { epoch, .. } => *epoch,
        }
    }
}

/// Writer handle given to the background task for one load generation.
///
/// The handle stamps every event with its generation and exposes
/// [`LoadHandle::is_live`] so the task can stop fetching as soon as a newer
/// load has taken over.
#[derive(Debug)]
pub struct LoadHandle<T> {
    epoch: u64,
    live: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<ListEvent<T>>,
}

impl<T> LoadHandle<T> {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// False once a newer load has been started on the same list.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst) == self.epoch
    }

    pub fn first_batch(&self, items: Vec<T>, total_entries: usize) {
        let _ = self.tx.send(ListEvent::FirstBatch {
            epoch: self.epoch,
            items,
            total_entries,
        });
    }

    pub fn more_items(&self, items: Vec<T>) {
        let _ = self.tx.send(ListEvent::MoreItems { epoch: self.epoch, items });
    }

    pub fn finish(&self, outcome: LoadOutcome) {
        let _ = self.tx.send(ListEvent::Finished { epoch: self.epoch, outcome });
    }
}

/// Reducer state for one progressively loaded listing.
#[derive(Debug)]
pub struct ResourceList<T> {
    items: Vec<T>,
    total_entries: usize,
    loading: bool,
    outcome: Option<LoadOutcome>,
    live: Arc<AtomicU64>,
    rx: mpsc::UnboundedReceiver<ListEvent<T>>,
    tx: mpsc::UnboundedSender<ListEvent<T>>,
}

impl<T> ResourceList<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            items: Vec::new(),
            total_entries: 0,
            loading: false,
            outcome: None,
            live: Arc::new(AtomicU64::new(0)),
            rx,
            tx,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Backend-reported size of the full set, which can exceed `len()` while
    /// later pages are still in flight.
    pub fn total_entries(&self) -> usize {
        self.total_entries
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn outcome(&self) -> Option<LoadOutcome> {
        self.outcome
    }

    pub fn current_epoch(&self) -> u64 {
        self.live.load(Ordering::SeqCst)
    }

    /// Start a new load generation. Older generations become stale
    /// immediately; their in-flight events will be dropped on arrival.
    ///
    /// Existing rows are kept until the new first batch replaces them, so a
    /// refresh does not blank the table.
    pub fn begin_load(&mut self) -> LoadHandle<T> {
        let epoch = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.loading = true;
        self.outcome = None;
        LoadHandle {
            epoch,
            live: Arc::clone(&self.live),
            tx: self.tx.clone(),
        }
    }

    /// Drop all rows and invalidate every in-flight load. Used when the list
    /// is rebound to a different parent resource.
    pub fn reset(&mut self) {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.items.clear();
        self.total_entries = 0;
        self.loading = false;
        self.outcome = None;
    }

    /// Drain pending events from the channel. Returns true if anything was
    /// applied, so callers know to rebuild derived state.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.rx.try_recv() {
            changed |= self.apply(event);
        }
        changed
    }

    /// Apply one event. Events from a stale generation are discarded.
    pub fn apply(&mut self, event: ListEvent<T>) -> bool {
        if event.epoch() != self.current_epoch() {
            log::debug!(
                "dropping stale list event (epoch {} != {})",
                event.epoch(),
                self.current_epoch()
            );
            return false;
        }
        match event {
            ListEvent::FirstBatch { items, total_entries, .. } => {
                self.items = items;
                self.total_entries = total_entries;
                self.loading = false;
            }
            ListEvent::MoreItems { items, .. } => {
                self.items.extend(items);
            }
            ListEvent::Finished { outcome, .. } => {
                self.loading = false;
                self.outcome = Some(outcome);
            }
        }
        true
    }
}

impl<T> Default for ResourceList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_batch_replaces_and_clears_loading() {
        let mut list: ResourceList<u32> = ResourceList::new();
        let handle = list.begin_load();
        assert!(list.is_loading());

        handle.first_batch(vec![1, 2, 3], 10);
        assert!(list.poll());

        assert_eq!(list.items(), &[1, 2, 3]);
        assert_eq!(list.total_entries(), 10);
        assert!(!list.is_loading(), "loading clears on first batch, not at the end");
        assert_eq!(list.outcome(), None, "outcome unset while pages remain");
    }

    #[test]
    fn test_more_items_append_in_order() {
        let mut list: ResourceList<u32> = ResourceList::new();
        let handle = list.begin_load();
        handle.first_batch(vec![1, 2], 6);
        handle.more_items(vec![3, 4]);
        handle.more_items(vec![5, 6]);
        handle.finish(LoadOutcome::Complete);
        list.poll();

        assert_eq!(list.items(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(list.outcome(), Some(LoadOutcome::Complete));
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut list: ResourceList<&'static str> = ResourceList::new();
        let first = list.begin_load();
        let second = list.begin_load();
        assert!(!first.is_live());
        assert!(second.is_live());

        // Newer load resolves first; the superseded one straggles in later.
        second.first_batch(vec!["b1"], 1);
        second.finish(LoadOutcome::Complete);
        first.first_batch(vec!["a1", "a2"], 2);
        first.finish(LoadOutcome::Complete);
        list.poll();

        assert_eq!(list.items(), &["b1"]);
        assert_eq!(list.total_entries(), 1);
        assert_eq!(list.outcome(), Some(LoadOutcome::Complete));
    }

    #[test]
    fn test_stale_append_after_new_first_batch() {
        let mut list: ResourceList<&'static str> = ResourceList::new();
        let first = list.begin_load();
        first.first_batch(vec!["a1"], 3);
        list.poll();

        let second = list.begin_load();
        // Straggler page from the old generation arrives mid-reload.
        first.more_items(vec!["a2"]);
        second.first_batch(vec!["b1"], 1);
        list.poll();

        assert_eq!(list.items(), &["b1"]);
    }

    #[test]
    fn test_refresh_keeps_rows_until_replacement_arrives() {
        let mut list: ResourceList<u32> = ResourceList::new();
        let handle = list.begin_load();
        handle.first_batch(vec![1, 2], 2);
        handle.finish(LoadOutcome::Complete);
        list.poll();

        let _reload = list.begin_load();
        assert!(list.is_loading());
        assert_eq!(list.items(), &[1, 2], "stale rows stay visible during refresh");
        assert_eq!(list.outcome(), None);
    }

    #[test]
    fn test_reset_clears_rows_and_invalidates_inflight() {
        let mut list: ResourceList<u32> = ResourceList::new();
        let handle = list.begin_load();
        handle.first_batch(vec![1], 1);
        list.poll();

        list.reset();
        assert!(list.is_empty());
        assert!(!handle.is_live());

        // Straggler from before the reset has no effect.
        handle.more_items(vec![99]);
        assert!(!list.poll());
        assert!(list.is_empty());
    }

    #[test]
    fn test_failed_load_keeps_nothing_partial_keeps_prefix() {
        let mut failed: ResourceList<u32> = ResourceList::new();
        let handle = failed.begin_load();
        handle.finish(LoadOutcome::Failed);
        failed.poll();
        assert!(failed.is_empty());
        assert!(!failed.is_loading());
        assert_eq!(failed.outcome(), Some(LoadOutcome::Failed));

        let mut partial: ResourceList<u32> = ResourceList::new();
        let handle = partial.begin_load();
        handle.first_batch(vec![1, 2], 5);
        handle.finish(LoadOutcome::Partial);
        partial.poll();
        assert_eq!(partial.items(), &[1, 2]);
        assert_eq!(partial.outcome(), Some(LoadOutcome::Partial));
    }
}
