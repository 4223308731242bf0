//! logship Sinks - search index delivery
//!
//! Writes every well-formed bus record to a search index.
//!
//! # Architecture
//!
//! ```text
//! [Bus] --batch--> [IndexSinkPipeline] --bulk create--> [SearchBackend]
//!                        │                                   │
//!                  parse + drop malformed          ElasticsearchClient (HTTP)
//! ```
//!
//! # Example
//!
//! ```ignore
//! let backend = Arc::new(ElasticsearchClient::new(&ElasticsearchConfig::default())?);
//! let sink = IndexSinkPipeline::new(IndexSinkConfig::default(), connector, backend);
//!
//! // Ensures the index, then consumes until cancelled
//! let stats = sink.run(cancel).await?;
//! ```

/// Index sink pipeline and its metrics
pub mod index;

/// Search backend interface and Elasticsearch client
pub mod search;

mod error;

pub use error::{Result, SearchError, SearchResult, SinkError};
pub use index::{IndexMetrics, IndexSinkConfig, IndexSinkPipeline, IndexStats, ensure_index};
pub use search::{
    BulkItemFailure, BulkResponse, ElasticsearchClient, ElasticsearchConfig, SearchBackend,
    index_mapping,
};
