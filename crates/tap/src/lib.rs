//! logship Tap - live-follow streaming of log lines
//!
//! This crate serves the "follow logs" stream for one instance. Each follow
//! request gets its own [`LiveTailRouter`] with its own bus subscription:
//!
//! - Parses every record's `[created][instance][file]` header
//! - Keeps records of the requested instance (and optionally one file)
//! - Sends one aggregated reply per batch, nothing for batches without matches
//! - Closes its subscription exactly once, however the stream ends
//!
//! # Architecture
//!
//! ```text
//! FollowRequest ──→ FilterCriteria
//!                        │
//! Bus ──batch──→ LiveTailRouter ──FollowReply──→ ReplyStream ──→ client
//!     ◄──────────── returns after the send completes (backpressure)
//! ```

mod error;
pub mod filter;
pub mod router;
pub mod stream;

pub use error::{Result, TapError};
pub use filter::FilterCriteria;
pub use router::{
    DEFAULT_DRAIN_TIMEOUT, LiveTailRouter, SubscriptionParams, TailMetrics, TailStats,
};
pub use stream::ReplyStream;
