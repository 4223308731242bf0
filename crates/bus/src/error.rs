//! Error types for the bus crate

use thiserror::Error;

/// Boxed error returned by batch handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur on a bus subscription
#[derive(Error, Debug)]
pub enum BusError {
    /// The batch handler returned an error; the subscription stops
    #[error("batch handler failed: {0}")]
    Handler(#[source] HandlerError),

    /// Topic pattern is not a valid regex
    #[error("invalid topic pattern '{pattern}': {source}")]
    InvalidTopicPattern {
        /// The rejected pattern
        pattern: String,
        /// Regex compile error
        #[source]
        source: regex::Error,
    },

    /// Partition numbers start at 0
    #[error("invalid partition {partition} for topic '{topic}'")]
    InvalidPartition {
        /// Target topic
        topic: String,
        /// The rejected partition
        partition: i32,
    },

    /// Unrecoverable read error
    #[error("bus read failed: {0}")]
    Read(String),
}

/// Result type for bus operations
pub type Result<T> = std::result::Result<T, BusError>;
