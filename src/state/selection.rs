//! Multi-select state for document rows.

use std::collections::HashSet;

use uuid::Uuid;

/// Set of selected document ids.
///
/// Lives independently of filtering: narrowing the visible rows does not
/// prune the selection, so hidden rows stay selected and reappear checked.
/// Callers clear it explicitly on refetch and on collection change.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    ids: HashSet<Uuid>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: Uuid) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Replace the selection with exactly the given ids.
    pub fn select_all<I: IntoIterator<Item = Uuid>>(&mut self, ids: I) {
        self.ids = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.ids.contains(&id)
    }

    /// True when every given id is selected. An empty iterator is trivially
    /// covered, so callers should guard the select-all toggle on emptiness.
    pub fn contains_all<'a, I: IntoIterator<Item = &'a Uuid>>(&self, ids: I) -> bool {
        ids.into_iter().all(|id| self.ids.contains(id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Snapshot in stable order, for bulk operations and display.
    pub fn ids_sorted(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.ids.iter().copied().collect();
        ids.sort();
        ids
    }
}
