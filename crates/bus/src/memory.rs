//! In-process bus
//!
//! `MemoryBus` implements the subscription interface over in-memory topic
//! logs. It keeps the semantics consumers rely on:
//!
//! - Partitioned, append-only topics with per-partition offsets
//! - Per-group committed offsets; a group resumes where it left off
//! - `OffsetPolicy` decides the start position of a group with no commits
//! - Batches are committed only after the handler returns `Ok`
//! - `run` awaits the handler before fetching the next batch
//! - Each batch starts filling from the next partition in turn, so a busy
//!   partition cannot starve the others
//!
//! It is used by tests and by the replay tool, which feeds records read
//! from files through the same code paths as a real bus.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use logship_protocol::{Bytes, OffsetPolicy, RawRecord};

use crate::error::{BusError, Result};
use crate::subscription::{
    BatchHandler, BusConnector, BusSubscription, ConsumerOptions, SubscriptionConfig,
    TopicSelector,
};

/// (topic, partition)
type PartitionKey = (String, i32);

/// In-process partitioned bus
///
/// Cloning is cheap; clones share the same topics.
#[derive(Debug, Clone, Default)]
pub struct MemoryBus {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<BusState>,
    /// Wakes subscriptions waiting for new records
    notify: Notify,
}

#[derive(Debug, Default)]
struct BusState {
    /// Topic name -> partitions -> records
    topics: HashMap<String, Vec<Vec<RawRecord>>>,
    /// (group, topic, partition) -> next offset to read
    committed: HashMap<(String, String, i32), i64>,
}

impl MemoryBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a topic with at least `partitions` partitions
    pub fn create_topic(&self, topic: &str, partitions: usize) {
        let mut state = self.inner.state.lock();
        let parts = state.topics.entry(topic.to_string()).or_default();
        if parts.len() < partitions {
            parts.resize_with(partitions, Vec::new);
        }
    }

    /// Append a record to partition 0 of a topic
    ///
    /// Returns the offset of the new record.
    pub fn publish(&self, topic: &str, value: impl Into<Bytes>) -> i64 {
        self.append(topic, 0, value.into())
    }

    /// Append a record to a specific partition
    ///
    /// Creates the topic and any missing partitions on demand. Negative
    /// partitions are rejected.
    pub fn publish_to(&self, topic: &str, partition: i32, value: impl Into<Bytes>) -> Result<i64> {
        let index = usize::try_from(partition).map_err(|_| BusError::InvalidPartition {
            topic: topic.to_string(),
            partition,
        })?;
        Ok(self.append(topic, index, value.into()))
    }

    fn append(&self, topic: &str, index: usize, value: Bytes) -> i64 {
        let offset = {
            let mut state = self.inner.state.lock();
            let parts = state.topics.entry(topic.to_string()).or_default();
            if parts.len() <= index {
                parts.resize_with(index + 1, Vec::new);
            }
            let log = &mut parts[index];
            let offset = log.len() as i64;
            log.push(RawRecord::new(topic, index as i32, offset, value));
            offset
        };

        self.inner.notify.notify_waiters();
        offset
    }

    /// Number of records in a topic across all partitions
    pub fn topic_len(&self, topic: &str) -> usize {
        self.inner
            .state
            .lock()
            .topics
            .get(topic)
            .map_or(0, |parts| parts.iter().map(Vec::len).sum())
    }

    /// Next offset a group will read from a partition, if it has committed
    pub fn committed_offset(&self, group_id: &str, topic: &str, partition: i32) -> Option<i64> {
        self.inner
            .state
            .lock()
            .committed
            .get(&(group_id.to_string(), topic.to_string(), partition))
            .copied()
    }

    /// Snapshot of the current end offset of every partition
    fn end_offsets(&self) -> HashMap<PartitionKey, i64> {
        let state = self.inner.state.lock();
        state
            .topics
            .iter()
            .flat_map(|(topic, parts)| {
                parts
                    .iter()
                    .enumerate()
                    .map(move |(p, log)| ((topic.clone(), p as i32), log.len() as i64))
            })
            .collect()
    }
}

#[async_trait]
impl BusConnector for MemoryBus {
    async fn subscribe(
        &self,
        group_id: &str,
        config: &SubscriptionConfig,
        handler: Arc<dyn BatchHandler>,
        options: ConsumerOptions,
    ) -> Result<Box<dyn BusSubscription>> {
        debug!(
            group_id,
            offsets_initial = %config.offsets_initial,
            balance_strategy = %config.balance_strategy,
            batch_size = options.effective_batch_size(),
            "memory bus subscription created"
        );

        Ok(Box::new(MemorySubscription {
            inner: Arc::clone(&self.inner),
            group_id: group_id.to_string(),
            handler,
            batch_size: options.effective_batch_size(),
            offsets_initial: config.offsets_initial,
            start_offsets: self.end_offsets(),
            positions: Mutex::new(HashMap::new()),
            next_start: AtomicUsize::new(0),
            closed: CancellationToken::new(),
        }))
    }
}

/// Subscription on a [`MemoryBus`]
struct MemorySubscription {
    inner: Arc<Inner>,
    group_id: String,
    handler: Arc<dyn BatchHandler>,
    batch_size: usize,
    offsets_initial: OffsetPolicy,
    /// End offsets when the subscription was created (for `Newest`)
    start_offsets: HashMap<PartitionKey, i64>,
    /// Next offset to deliver per partition
    positions: Mutex<HashMap<PartitionKey, i64>>,
    /// Partition the next batch starts from (index into the sorted list)
    next_start: AtomicUsize,
    closed: CancellationToken,
}

impl MemorySubscription {
    /// Collect the next batch without advancing positions
    ///
    /// Partitions are visited in (topic, partition) order, starting one
    /// further along on every call.
    fn next_batch(&self, topics: &TopicSelector) -> Vec<RawRecord> {
        let state = self.inner.state.lock();
        let positions = self.positions.lock();

        let mut names: Vec<&String> = state.topics.keys().filter(|t| topics.matches(t)).collect();
        names.sort();

        let partitions: Vec<(&String, usize)> = names
            .into_iter()
            .flat_map(|name| (0..state.topics[name].len()).map(move |p| (name, p)))
            .collect();
        if partitions.is_empty() {
            return Vec::new();
        }
        let start = self.next_start.fetch_add(1, Ordering::Relaxed) % partitions.len();

        let mut batch = Vec::new();
        for i in 0..partitions.len() {
            let remaining = self.batch_size - batch.len();
            if remaining == 0 {
                break;
            }

            let (name, p) = partitions[(start + i) % partitions.len()];
            let log = &state.topics[name][p];
            let key = (name.clone(), p as i32);
            let from = positions
                .get(&key)
                .copied()
                .unwrap_or_else(|| self.initial_position(&state, &key));
            let from = (from.max(0) as usize).min(log.len());

            batch.extend(log[from..].iter().take(remaining).cloned());
        }
        batch
    }

    /// Start position for a partition this subscription has not read yet
    fn initial_position(&self, state: &BusState, key: &PartitionKey) -> i64 {
        let committed_key = (self.group_id.clone(), key.0.clone(), key.1);
        if let Some(&offset) = state.committed.get(&committed_key) {
            return offset;
        }

        match self.offsets_initial {
            OffsetPolicy::Oldest => 0,
            // Partitions created after subscribing only hold new arrivals
            OffsetPolicy::Newest => self.start_offsets.get(key).copied().unwrap_or(0),
        }
    }

    /// Advance positions and the group's committed offsets past a batch
    fn commit(&self, batch: &[RawRecord]) {
        let mut state = self.inner.state.lock();
        let mut positions = self.positions.lock();

        for record in batch {
            let next = record.offset() + 1;
            positions.insert((record.topic().to_string(), record.partition()), next);
            state.committed.insert(
                (
                    self.group_id.clone(),
                    record.topic().to_string(),
                    record.partition(),
                ),
                next,
            );
        }
    }
}

#[async_trait]
impl BusSubscription for MemorySubscription {
    async fn run(&self, topics: &TopicSelector) -> Result<()> {
        info!(group_id = %self.group_id, topics = %topics, "memory subscription consuming");

        loop {
            // Register for wakeups before checking, so a publish in between is not lost
            let notified = self.inner.notify.notified();

            if self.closed.is_cancelled() {
                break;
            }

            let batch = self.next_batch(topics);
            if batch.is_empty() {
                tokio::select! {
                    _ = notified => {}
                    _ = self.closed.cancelled() => break,
                }
                continue;
            }

            self.handler
                .handle_batch(&batch)
                .await
                .map_err(BusError::Handler)?;
            self.commit(&batch);
        }

        debug!(group_id = %self.group_id, "memory subscription stopped");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.is_cancelled() {
            self.closed.cancel();
            debug!(group_id = %self.group_id, "memory subscription closed");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
