//! Backend API client.
//!
//! `CollectionApi` is the seam between the console and the retrieval
//! backend: state and view code depend only on the trait, so tests swap in
//! scripted doubles and the binary wires up the reqwest-backed [`HttpApi`].

pub mod error;
pub mod http;
pub mod types;

use async_trait::async_trait;

pub use error::{ApiError, ApiResult};
pub use http::HttpApi;
pub use types::{
    Collection, CollectionId, CollectionUpdate, DocumentDetail, DocumentId, DocumentSummary,
    ExtractionStatus, IngestionStatus, ItemKind, Page, UserId, UserSummary,
};

/// Operations the console performs against the backend's v3 API.
///
/// Listings are offset/limit paginated; callers are expected to walk pages
/// until the running offset reaches `Page::total_entries`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CollectionApi: Send + Sync {
    /// Fetch one collection's metadata.
    async fn retrieve_collection(&self, id: CollectionId) -> ApiResult<Collection>;

    /// Update a collection's name and/or description, returning the new record.
    async fn update_collection(
        &self,
        id: CollectionId,
        update: CollectionUpdate,
    ) -> ApiResult<Collection>;

    /// List collections visible to the caller.
    async fn list_collections(&self, offset: usize, limit: usize) -> ApiResult<Page<Collection>>;

    /// List documents assigned to a collection.
    async fn list_documents(
        &self,
        collection_id: CollectionId,
        offset: usize,
        limit: usize,
    ) -> ApiResult<Page<DocumentSummary>>;

    /// List users with access to a collection.
    async fn list_users(
        &self,
        collection_id: CollectionId,
        offset: usize,
        limit: usize,
    ) -> ApiResult<Page<UserSummary>>;

    /// Fetch one document's full record.
    async fn retrieve_document(&self, id: DocumentId) -> ApiResult<DocumentDetail>;

    /// Remove a document or user from a collection. The underlying resource
    /// is not deleted, only its membership.
    async fn remove_item(
        &self,
        collection_id: CollectionId,
        item_id: uuid::Uuid,
        kind: ItemKind,
    ) -> ApiResult<()>;
}
