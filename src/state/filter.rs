//! Client-side filtering, searching, and sorting of document listings.
//!
//! All of this operates on the fully fetched in-memory list; nothing here
//! issues backend requests. The derivation is pure: the same list, filter
//! state, query, and sort always produce the same visible rows.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::client::{DocumentSummary, ExtractionStatus, IngestionStatus};

pub const INGESTION_FIELD: &str = "ingestion_status";
pub const EXTRACTION_FIELD: &str = "extraction_status";

// ============================================================================
// Filter State
// ============================================================================

/// Per-field accepted-value sets for document rows.
///
/// Semantics mirror checkbox groups: a field with a non-empty set keeps only
/// rows whose value is in the set, a field with an empty set imposes no
/// constraint, and keys naming no known field are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFilters {
    accepted: IndexMap<String, BTreeSet<String>>,
}

impl DocumentFilters {
    /// Fresh filter state with every status value accepted.
    pub fn new() -> Self {
        let mut accepted = IndexMap::new();
        accepted.insert(
            INGESTION_FIELD.to_string(),
            IngestionStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
        );
        accepted.insert(
            EXTRACTION_FIELD.to_string(),
            ExtractionStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
        );
        Self { accepted }
    }

    pub fn accepts(&self, field: &str, value: &str) -> bool {
        self.accepted
            .get(field)
            .map(|set| set.contains(value))
            .unwrap_or(false)
    }

    /// Flip one value in a field's accepted set. Unknown fields get a set
    /// created on the fly, which keeps the mapping open-ended.
    pub fn toggle(&mut self, field: &str, value: &str) {
        let set = self.accepted.entry(field.to_string()).or_default();
        if !set.remove(value) {
            set.insert(value.to_string());
        }
    }

    /// True when some known field actually narrows the listing.
    pub fn restricts(&self) -> bool {
        self.field_restricts(INGESTION_FIELD, &IngestionStatus::ALL.map(|s| s.as_str()))
            || self.field_restricts(EXTRACTION_FIELD, &ExtractionStatus::ALL.map(|s| s.as_str()))
    }

    fn field_restricts(&self, field: &str, all: &[&str]) -> bool {
        match self.accepted.get(field) {
            // An empty set means "no constraint", same as a full one.
            Some(set) if !set.is_empty() => !all.iter().all(|v| set.contains(*v)),
            _ => false,
        }
    }

    pub fn matches(&self, doc: &DocumentSummary) -> bool {
        self.accepted.iter().all(|(field, set)| {
            if set.is_empty() {
                return true;
            }
            match field.as_str() {
                INGESTION_FIELD => set.contains(doc.ingestion_status.as_str()),
                EXTRACTION_FIELD => set.contains(doc.extraction_status.as_str()),
                _ => true,
            }
        })
    }
}

impl Default for DocumentFilters {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Sort State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Title,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self { key: SortKey::Title, order: SortOrder::Asc }
    }
}

impl SortSpec {
    /// Step through the four sort modes in a fixed cycle.
    pub fn cycle(self) -> Self {
        match (self.key, self.order) {
            (SortKey::Title, SortOrder::Asc) => Self { key: SortKey::Title, order: SortOrder::Desc },
            (SortKey::Title, SortOrder::Desc) => {
                Self { key: SortKey::CreatedAt, order: SortOrder::Asc }
            }
            (SortKey::CreatedAt, SortOrder::Asc) => {
                Self { key: SortKey::CreatedAt, order: SortOrder::Desc }
            }
            (SortKey::CreatedAt, SortOrder::Desc) => {
                Self { key: SortKey::Title, order: SortOrder::Asc }
            }
        }
    }

    pub fn label(&self) -> String {
        let key = match self.key {
            SortKey::Title => "title",
            SortKey::CreatedAt => "created",
        };
        let arrow = match self.order {
            SortOrder::Asc => "↑",
            SortOrder::Desc => "↓",
        };
        format!("{} {}", key, arrow)
    }
}

// ============================================================================
// Visible-Row Derivation
// ============================================================================

/// Compute the visible rows for a document table: filter, then search, then
/// sort. Returns indices into `docs` so callers keep one owned list.
pub fn visible_documents(
    docs: &[DocumentSummary],
    filters: &DocumentFilters,
    query: &str,
    sort: SortSpec,
) -> Vec<usize> {
    let query = query.trim().to_lowercase();

    let mut visible: Vec<usize> = docs
        .iter()
        .enumerate()
        .filter(|(_, doc)| filters.matches(doc) && matches_search(doc, &query))
        .map(|(i, _)| i)
        .collect();

    // Stable sort: ties keep backend order.
    visible.sort_by(|&a, &b| compare_docs(&docs[a], &docs[b], sort));
    visible
}

fn matches_search(doc: &DocumentSummary, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let title_hit = doc
        .title
        .as_deref()
        .map(|t| t.to_lowercase().contains(query))
        .unwrap_or(false);
    title_hit || doc.id.to_string().contains(query)
}

fn compare_docs(a: &DocumentSummary, b: &DocumentSummary, sort: SortSpec) -> Ordering {
    let directed = |ord: Ordering| match sort.order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    };
    match sort.key {
        SortKey::Title => {
            let ta = sort_title(a);
            let tb = sort_title(b);
            // Untitled rows sink to the bottom in either direction.
            match (ta, tb) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(ta), Some(tb)) => directed(ta.cmp(&tb)),
            }
        }
        SortKey::CreatedAt => directed(a.created_at.cmp(&b.created_at)),
    }
}

fn sort_title(doc: &DocumentSummary) -> Option<String> {
    doc.title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(|t| t.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn doc(
        id: &str,
        title: Option<&str>,
        ingestion: IngestionStatus,
        extraction: ExtractionStatus,
        day: u32,
    ) -> DocumentSummary {
        DocumentSummary {
            id: Uuid::parse_str(id).unwrap(),
            title: title.map(str::to_string),
            ingestion_status: ingestion,
            extraction_status: extraction,
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            metadata: serde_json::Value::Null,
        }
    }

    fn sample() -> Vec<DocumentSummary> {
        vec![
            doc(
                "00000000-0000-4000-8000-0000000000aa",
                Some("Zoning Report"),
                IngestionStatus::Success,
                ExtractionStatus::Success,
                3,
            ),
            doc(
                "00000000-0000-4000-8000-0000000000bb",
                Some("annual summary"),
                IngestionStatus::Failure,
                ExtractionStatus::Failed,
                1,
            ),
            doc(
                "00000000-0000-4000-8000-0000000000cc",
                None,
                IngestionStatus::Pending,
                ExtractionStatus::Pending,
                2,
            ),
        ]
    }

    #[test]
    fn test_fresh_filters_match_everything() {
        let docs = sample();
        let filters = DocumentFilters::new();
        assert!(!filters.restricts());
        let visible = visible_documents(&docs, &filters, "", SortSpec::default());
        assert_eq!(visible.len(), 3);
    }

    #[test]
    fn test_restricting_ingestion_drops_other_rows() {
        let docs = sample();
        let mut filters = DocumentFilters::new();
        for status in ["failure", "pending", "parsing", "chunking", "embedding", "storing", "enriched"] {
            filters.toggle(INGESTION_FIELD, status);
        }
        assert!(filters.restricts());

        let visible = visible_documents(&docs, &filters, "", SortSpec::default());
        assert_eq!(visible, vec![0]);
    }

    #[test]
    fn test_empty_accepted_set_is_no_constraint() {
        let docs = sample();
        let mut filters = DocumentFilters::new();
        for status in IngestionStatus::ALL {
            filters.toggle(INGESTION_FIELD, status.as_str());
        }
        assert!(!filters.restricts());
        let visible = visible_documents(&docs, &filters, "", SortSpec::default());
        assert_eq!(visible.len(), 3, "unchecking every box hides nothing");
    }

    #[test]
    fn test_unknown_filter_key_is_ignored() {
        let docs = sample();
        let mut filters = DocumentFilters::new();
        filters.toggle("embedding_model", "ada-002");
        assert!(!filters.restricts());
        let visible = visible_documents(&docs, &filters, "", SortSpec::default());
        assert_eq!(visible.len(), 3);
    }

    #[test]
    fn test_search_is_case_insensitive_on_title() {
        let docs = sample();
        let filters = DocumentFilters::new();
        let visible = visible_documents(&docs, &filters, "ZONING", SortSpec::default());
        assert_eq!(visible, vec![0]);
    }

    #[test]
    fn test_search_matches_id_substring() {
        let docs = sample();
        let filters = DocumentFilters::new();
        let visible = visible_documents(&docs, &filters, "00bb", SortSpec::default());
        assert_eq!(visible, vec![1]);
    }

    #[test]
    fn test_whitespace_query_matches_all() {
        let docs = sample();
        let filters = DocumentFilters::new();
        let visible = visible_documents(&docs, &filters, "   ", SortSpec::default());
        assert_eq!(visible.len(), 3);
    }

    #[test]
    fn test_title_sort_is_case_insensitive_with_untitled_last() {
        let docs = sample();
        let filters = DocumentFilters::new();

        let asc = visible_documents(&docs, &filters, "", SortSpec::default());
        assert_eq!(asc, vec![1, 0, 2], "annual < zoning, untitled last");

        let desc = visible_documents(
            &docs,
            &filters,
            "",
            SortSpec { key: SortKey::Title, order: SortOrder::Desc },
        );
        assert_eq!(desc, vec![0, 1, 2], "descending still keeps untitled last");
    }

    #[test]
    fn test_created_at_sort() {
        let docs = sample();
        let filters = DocumentFilters::new();
        let spec = SortSpec { key: SortKey::CreatedAt, order: SortOrder::Desc };
        assert_eq!(visible_documents(&docs, &filters, "", spec), vec![0, 2, 1]);
    }

    #[test]
    fn test_sort_cycle_visits_all_modes() {
        let start = SortSpec::default();
        let mut spec = start;
        for _ in 0..4 {
            spec = spec.cycle();
        }
        assert_eq!(spec, start);
    }

    fn arb_doc() -> impl Strategy<Value = DocumentSummary> {
        (
            any::<u128>(),
            proptest::option::of("[a-z ]{0,12}"),
            0..IngestionStatus::ALL.len(),
            0..ExtractionStatus::ALL.len(),
            1u32..28,
        )
            .prop_map(|(id, title, ing, ext, day)| DocumentSummary {
                id: Uuid::from_u128(id),
                title,
                ingestion_status: IngestionStatus::ALL[ing],
                extraction_status: ExtractionStatus::ALL[ext],
                created_at: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
                updated_at: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
                metadata: serde_json::Value::Null,
            })
    }

    proptest! {
        /// Re-deriving over an already-derived sublist changes nothing.
        #[test]
        fn prop_derivation_is_idempotent(
            docs in proptest::collection::vec(arb_doc(), 0..40),
            query in "[a-z0]{0,4}",
        ) {
            let mut filters = DocumentFilters::new();
            filters.toggle(INGESTION_FIELD, "pending");
            let sort = SortSpec::default();

            let once = visible_documents(&docs, &filters, &query, sort);
            let sublist: Vec<DocumentSummary> =
                once.iter().map(|&i| docs[i].clone()).collect();
            let twice = visible_documents(&sublist, &filters, &query, sort);

            prop_assert_eq!(twice, (0..sublist.len()).collect::<Vec<_>>());
        }

        /// Every returned index is in bounds and appears exactly once.
        #[test]
        fn prop_indices_are_unique_and_in_bounds(
            docs in proptest::collection::vec(arb_doc(), 0..40),
            query in "[a-z]{0,3}",
        ) {
            let filters = DocumentFilters::new();
            let visible = visible_documents(&docs, &filters, &query, SortSpec::default());
            let mut seen = std::collections::HashSet::new();
            for &i in &visible {
                prop_assert!(i < docs.len());
                prop_assert!(seen.insert(i));
            }
        }
    }
}
