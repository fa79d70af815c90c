//! Reqwest-backed implementation of [`CollectionApi`].
//!
//! Single-resource responses arrive wrapped in a `results` envelope; listing
//! responses carry `results` plus `total_entries` and decode straight into
//! [`Page`]. Error bodies are `{"detail": ...}` or `{"message": ...}`,
//! with the raw text as a fallback when neither parses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use super::types::{
    Collection, CollectionId, CollectionUpdate, DocumentDetail, DocumentId, DocumentSummary,
    ItemKind, Page, UserSummary,
};
use super::CollectionApi;

// ============================================================================
// Envelope Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ResultsEnvelope<T> {
    results: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        if let Some(detail) = self.detail {
            return Some(match detail {
                serde_json::Value::String(s) => s,
                other => other
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| other.to_string()),
            });
        }
        self.message
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client for the backend's v3 REST API.
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> ApiResult<Self> {
        Url::parse(base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }
        req
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder, path: &str) -> ApiResult<T> {
        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Self::error_from(path, status, response).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::invalid_response(format!("{path}: {e}")))
    }

    async fn error_from(path: &str, status: StatusCode, response: reqwest::Response) -> ApiError {
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::NOT_FOUND {
            return ApiError::not_found(path);
        }
        if let Ok(envelope) = serde_json::from_str::<ErrorBody>(&body) {
            if let Some(message) = envelope.message() {
                return ApiError::api(status.as_u16(), message);
            }
        }
        ApiError::api(status.as_u16(), body)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: String,
        offset: usize,
        limit: usize,
    ) -> ApiResult<Page<T>> {
        debug!("GET {} offset={} limit={}", path, offset, limit);
        let req = self
            .request(Method::GET, &path)
            .query(&[("offset", offset), ("limit", limit)]);
        self.send_json(req, &path).await
    }
}

#[async_trait]
impl CollectionApi for HttpApi {
    async fn retrieve_collection(&self, id: CollectionId) -> ApiResult<Collection> {
        let path = format!("/v3/collections/{}", id);
        debug!("GET {}", path);
        let envelope: ResultsEnvelope<Collection> =
            self.send_json(self.request(Method::GET, &path), &path).await?;
        Ok(envelope.results)
    }

    async fn update_collection(
        &self,
        id: CollectionId,
        update: CollectionUpdate,
    ) -> ApiResult<Collection> {
        let path = format!("/v3/collections/{}", id);
        debug!("POST {}", path);
        let req = self.request(Method::POST, &path).json(&update);
        let envelope: ResultsEnvelope<Collection> = self.send_json(req, &path).await?;
        Ok(envelope.results)
    }

    async fn list_collections(&self, offset: usize, limit: usize) -> ApiResult<Page<Collection>> {
        self.get_page("/v3/collections".to_string(), offset, limit).await
    }

    async fn list_documents(
        &self,
        collection_id: CollectionId,
        offset: usize,
        limit: usize,
    ) -> ApiResult<Page<DocumentSummary>> {
        let path = format!("/v3/collections/{}/documents", collection_id);
        self.get_page(path, offset, limit).await
    }

    async fn list_users(
        &self,
        collection_id: CollectionId,
        offset: usize,
        limit: usize,
    ) -> ApiResult<Page<UserSummary>> {
        let path = format!("/v3/collections/{}/users", collection_id);
        self.get_page(path, offset, limit).await
    }

    async fn retrieve_document(&self, id: DocumentId) -> ApiResult<DocumentDetail> {
        let path = format!("/v3/documents/{}", id);
        debug!("GET {}", path);
        let envelope: ResultsEnvelope<DocumentDetail> =
            self.send_json(self.request(Method::GET, &path), &path).await?;
        Ok(envelope.results)
    }

    async fn remove_item(
        &self,
        collection_id: CollectionId,
        item_id: Uuid,
        kind: ItemKind,
    ) -> ApiResult<()> {
        let segment = match kind {
            ItemKind::Document => "documents",
            ItemKind::User => "users",
        };
        let path = format!("/v3/collections/{}/{}/{}", collection_id, segment, item_id);
        debug!("DELETE {}", path);

        let response = self.request(Method::DELETE, &path).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from(&path, status, response).await);
        }
        Ok(())
    }
}
