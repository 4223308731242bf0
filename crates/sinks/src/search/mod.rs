//! Search backend interface
//!
//! The index sink only needs four operations from its backend:
//!
//! ```text
//! ping()                      connectivity check at startup
//! index_exists(name) -> bool
//! create_index(name, body)    settings + mapping
//! bulk_create(name, docs)     one request per batch, "create" semantics
//! ```
//!
//! [`ElasticsearchClient`] implements it over HTTP.

mod elasticsearch;
mod mapping;

use async_trait::async_trait;
use serde_json::Value;

use logship_protocol::IndexDocument;

use crate::error::SearchResult;

pub use elasticsearch::{
    DEFAULT_REQUEST_TIMEOUT, ElasticsearchClient, ElasticsearchConfig, bulk_body,
    parse_bulk_response,
};
pub use mapping::index_mapping;

/// Durable document store the index sink writes to
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Verify that the backend is reachable
    async fn ping(&self) -> SearchResult<()>;

    /// Check if an index exists
    async fn index_exists(&self, index: &str) -> SearchResult<bool>;

    /// Create an index with the given settings and mapping
    async fn create_index(&self, index: &str, body: &Value) -> SearchResult<()>;

    /// Write documents in one bulk request using "create" operations
    ///
    /// `Ok` means the request completed; individual documents may still have
    /// failed and are listed in the response.
    async fn bulk_create(&self, index: &str, docs: &[IndexDocument]) -> SearchResult<BulkResponse>;
}

/// Outcome of a completed bulk request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkResponse {
    /// Server-side processing time in milliseconds
    pub took_ms: u64,
    /// Number of operations the backend answered for
    pub items: usize,
    /// Operations that were rejected
    pub failures: Vec<BulkItemFailure>,
}

impl BulkResponse {
    /// Response where every one of `items` operations succeeded
    pub fn all_created(items: usize) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Number of documents written
    #[inline]
    pub fn created(&self) -> usize {
        self.items.saturating_sub(self.failures.len())
    }

    /// Check if any document was rejected
    #[inline]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// One rejected bulk operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    /// Position of the document in the request
    pub position: usize,
    /// HTTP status of the operation
    pub status: u16,
    /// Error type reported by the backend
    pub kind: String,
    /// Human-readable reason
    pub reason: String,
}
