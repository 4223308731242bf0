//! Protocol error types
//!
//! Errors that can occur when decoding bus records or protocol values.

use thiserror::Error;

/// A raw record that does not start with the three-field bracket header
///
/// Malformed records are dropped by every consumer. They are never retried
/// and never fail the batch they arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("record does not start with a [created][instance][file] header")]
pub struct MalformedRecord;

/// A name the search backend would reject as an index name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid index name '{name}': {reason}")]
pub struct InvalidIndexName {
    /// The rejected name
    pub name: String,
    /// Which rule it breaks
    pub reason: &'static str,
}

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Unknown replay-from-offset policy name
    #[error("invalid offset policy '{0}': expected 'oldest' or 'newest'")]
    InvalidOffsetPolicy(String),

    /// Unknown partition balance strategy name
    #[error("invalid balance strategy '{0}': expected 'range', 'roundrobin' or 'sticky'")]
    InvalidBalanceStrategy(String),

    /// Follow request is missing a required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
