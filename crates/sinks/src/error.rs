//! Error types for the sinks crate

use thiserror::Error;

use logship_bus::BusError;
use logship_protocol::InvalidIndexName;

/// Errors from a search backend
#[derive(Error, Debug)]
pub enum SearchError {
    /// No search node could be reached
    #[error("search backend unreachable: {0}")]
    Transport(String),

    /// The backend answered with an unexpected HTTP status
    #[error("search backend returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (may be truncated)
        body: String,
    },

    /// The response body could not be decoded
    #[error("invalid search backend response: {0}")]
    InvalidResponse(String),

    /// Request could not be encoded
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// Client configuration is unusable
    #[error("invalid search backend configuration: {0}")]
    Config(String),

    /// Index name cannot be used in a request path
    #[error(transparent)]
    IndexName(#[from] InvalidIndexName),
}

/// Errors from the index sink pipeline
#[derive(Error, Debug)]
pub enum SinkError {
    /// Index could not be verified or created; nothing was consumed
    #[error("index startup failed for '{index}': {source}")]
    Startup {
        /// Target index
        index: String,
        /// Underlying backend error
        #[source]
        source: SearchError,
    },

    /// Bulk request failed at the transport level
    #[error("bulk request failed: {0}")]
    Bulk(#[source] SearchError),

    /// Bus subscription failed
    #[error("bus error: {0}")]
    Bus(#[from] BusError),
}

/// Result type for search backend operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;
