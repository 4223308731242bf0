//! Service error types

use thiserror::Error;

use logship_protocol::ProtocolError;
use logship_sinks::{SearchError, SinkError};
use logship_tap::TapError;

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Follow request rejected before subscribing
    #[error("invalid follow request: {0}")]
    InvalidRequest(#[from] ProtocolError),

    /// Live-follow stream failed
    #[error(transparent)]
    Tap(#[from] TapError),

    /// Index sink failed
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Search backend client could not be built
    #[error("search backend: {0}")]
    Search(#[from] SearchError),

    /// Index sink is disabled in config
    #[error("index sink is disabled")]
    IndexDisabled,
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
