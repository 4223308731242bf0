//! Error types for the tap crate

use thiserror::Error;

use logship_bus::BusError;

/// Errors that can end a live-follow stream
#[derive(Error, Debug)]
pub enum TapError {
    /// The reply could not be delivered to the client stream
    #[error("reply stream send failed: {0}")]
    Send(String),

    /// Bus subscription failed or stopped with an error
    #[error("bus error: {0}")]
    Bus(#[from] BusError),
}

/// Result type for tap operations
pub type Result<T> = std::result::Result<T, TapError>;
