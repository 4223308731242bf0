//! logship Protocol - record types shared by the tail router and the index sink
//!
//! This crate provides the types that flow from the bus to both destinations:
//! - `RawRecord` - opaque bus payload with partition metadata
//! - `parse` - decodes the `[created][instance][file]` header of a raw record
//! - `ParsedLogRecord` - header fields plus log body
//! - `IndexDocument` - JSON document written to the search index
//! - `check_index_name` - index names the search backend accepts
//! - `FollowRequest` / `FollowReply` - live-follow stream shapes
//! - `OffsetPolicy` / `BalanceStrategy` - pass-through consumer settings
//!
//! # Data Flow
//!
//! ```text
//! Bus ──RawRecord──→ parse() ──┬──→ LiveTailRouter ──FollowReply──→ client
//!                              │
//!                              └──→ IndexSink ──IndexDocument──→ search index
//! ```

mod consumer;
mod document;
mod error;
mod follow;
mod parser;
mod record;

pub use consumer::{BalanceStrategy, OffsetPolicy};
pub use document::{IndexDocument, check_index_name};
pub use error::{InvalidIndexName, MalformedRecord, ProtocolError};
pub use follow::{FollowReply, FollowRequest};
pub use parser::{ParsedLogRecord, parse, parse_str};
pub use record::RawRecord;

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
