//! Wire types for the retrieval backend's v3 REST API.
//!
//! Field names and enum spellings follow the backend's JSON exactly; the
//! serde derives are the single source of truth for the wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CollectionId = Uuid;
pub type DocumentId = Uuid;
pub type UserId = Uuid;

// ============================================================================
// Status Enums
// ============================================================================

/// Pipeline state of a document's ingestion run.
///
/// `Enriched` is a post-success state; both it and `Success` mean the
/// document's chunks are available for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    Pending,
    Parsing,
    Chunking,
    Embedding,
    Storing,
    Failure,
    Success,
    Enriched,
}

impl IngestionStatus {
    pub const ALL: [IngestionStatus; 8] = [
        Self::Pending,
        Self::Parsing,
        Self::Chunking,
        Self::Embedding,
        Self::Storing,
        Self::Failure,
        Self::Success,
        Self::Enriched,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Parsing => "parsing",
            Self::Chunking => "chunking",
            Self::Embedding => "embedding",
            Self::Storing => "storing",
            Self::Failure => "failure",
            Self::Success => "success",
            Self::Enriched => "enriched",
        }
    }

    /// Chunk inspection is only meaningful once ingestion has produced chunks.
    pub fn is_inspectable(&self) -> bool {
        matches!(self, Self::Success | Self::Enriched)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failure | Self::Success | Self::Enriched)
    }
}

impl std::fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State of a document's graph-extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Pending,
    Success,
    Failed,
}

impl ExtractionStatus {
    pub const ALL: [ExtractionStatus; 3] = [Self::Pending, Self::Success, Self::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Resources
// ============================================================================

/// A named grouping of documents and users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Document row as returned by collection-scoped listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    #[serde(default)]
    pub title: Option<String>,
    pub ingestion_status: IngestionStatus,
    pub extraction_status: ExtractionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl DocumentSummary {
    /// Title if the backend recorded one, otherwise a placeholder.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => "Untitled",
        }
    }
}

/// Full document record, fetched individually for the inspection modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDetail {
    pub id: DocumentId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub size_in_bytes: Option<u64>,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub collection_ids: Vec<CollectionId>,
    pub ingestion_status: IngestionStatus,
    pub extraction_status: ExtractionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Member row as returned by collection-scoped user listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of a listing plus the backend's total count for the full set.
///
/// `total_entries` drives the progressive loader: pages are requested until
/// the running offset reaches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub total_entries: usize,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self { results: Vec::new(), total_entries: 0 }
    }
}

/// Partial update for a collection's editable fields. `None` fields are
/// omitted from the request body and left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CollectionUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Which kind of collection membership an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Document,
    User,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
