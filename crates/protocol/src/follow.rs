//! Live-follow request and reply shapes
//!
//! A client opens a follow stream with a [`FollowRequest`] and receives zero
//! or more [`FollowReply`] messages until it cancels or the stream fails.
//! The transport that carries them is not part of this crate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consumer::OffsetPolicy;
use crate::error::ProtocolError;

/// Request to follow the live logs of one instance
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowRequest {
    /// Instance whose lines are streamed (required)
    pub instance_id: String,
    /// Only stream this log file (None or empty = all files)
    pub log_file_name: Option<String>,
    /// Consumer group override (None = a fresh group per request)
    pub group_id: Option<String>,
    /// Topic override (None = the configured follow topic)
    pub topic: Option<String>,
    /// Where the subscription starts reading
    pub offsets_initial: OffsetPolicy,
    /// Maximum records per delivered batch (0 = configured default)
    pub batch_size: u32,
}

impl FollowRequest {
    /// Create a request for one instance with defaults for everything else
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            ..Self::default()
        }
    }

    /// Restrict the stream to one log file
    pub fn with_log_file(mut self, name: impl Into<String>) -> Self {
        self.log_file_name = Some(name.into());
        self
    }

    /// Use a specific consumer group
    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Follow a specific topic
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the replay-from-offset policy
    pub fn with_offsets_initial(mut self, policy: OffsetPolicy) -> Self {
        self.offsets_initial = policy;
        self
    }

    /// Set the batch size
    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    /// Check required fields
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.instance_id.is_empty() {
            return Err(ProtocolError::MissingField("instance_id"));
        }
        Ok(())
    }
}

/// One aggregated reply on a follow stream
///
/// Built fresh for every delivered batch that had at least one matching
/// record. Bodies keep their arrival order within each file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FollowReply {
    /// Topic the records were read from
    pub topic: String,
    /// Instance the stream follows
    pub instance_id: String,
    /// Log file name -> bodies in arrival order
    pub log_files: BTreeMap<String, Vec<String>>,
}

impl FollowReply {
    /// Total number of lines across all files
    pub fn line_count(&self) -> usize {
        self.log_files.values().map(Vec::len).sum()
    }

    /// Check if the reply carries no lines
    pub fn is_empty(&self) -> bool {
        self.log_files.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
#[path = "follow_test.rs"]
mod tests;
