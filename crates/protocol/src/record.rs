//! Raw bus records
//!
//! `RawRecord` is the unit the bus delivers: an opaque payload plus the
//! partition metadata it was read from. The core never mutates it.

use bytes::Bytes;

/// One record as delivered by the bus
///
/// Cloning is O(1): the payload is reference-counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Topic the record was read from
    topic: String,
    /// Partition within the topic
    partition: i32,
    /// Offset within the partition
    offset: i64,
    /// Record payload (the raw log line)
    value: Bytes,
}

impl RawRecord {
    /// Create a record with partition metadata
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64, value: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            value: value.into(),
        }
    }

    /// Topic the record was read from
    #[inline]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Partition the record was read from
    #[inline]
    pub fn partition(&self) -> i32 {
        self.partition
    }

    /// Offset of the record within its partition
    #[inline]
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Record payload
    #[inline]
    pub fn value(&self) -> &Bytes {
        &self.value
    }
}
