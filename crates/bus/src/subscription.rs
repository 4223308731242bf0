//! Bus subscription interface
//!
//! The bus owns offset tracking, rebalancing and replay policy. Consumers only
//! register a [`BatchHandler`] and drive the subscription:
//!
//! ```text
//! connector.subscribe(group, config, handler, options) -> subscription
//! subscription.run(topics)   // blocks: fetch batch → handler → fetch next
//! subscription.close()       // idempotent, makes run() return
//! ```
//!
//! # Backpressure
//!
//! `run` awaits the handler before fetching the next batch. A slow handler
//! (a slow RPC client, a slow search backend) directly slows consumption.
//! Implementations must not queue batches ahead of the handler.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use logship_protocol::{BalanceStrategy, OffsetPolicy, RawRecord};

use crate::error::{BusError, HandlerError, Result};

/// Callback invoked with each delivered batch
///
/// Returning an error stops the subscription: `run` returns
/// [`BusError::Handler`] and the batch is not committed. Whether the batch is
/// delivered again later is up to the bus.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    /// Process one batch to completion
    async fn handle_batch(&self, records: &[RawRecord]) -> std::result::Result<(), HandlerError>;
}

/// A registered subscription
#[async_trait]
pub trait BusSubscription: Send + Sync {
    /// Consume the selected topics until closed or a fatal error
    ///
    /// Returns `Ok(())` after [`close`](Self::close), or the error that
    /// stopped consumption.
    async fn run(&self, topics: &TopicSelector) -> Result<()>;

    /// Release the subscription
    ///
    /// Closing twice, or closing a subscription that never ran, is a no-op.
    async fn close(&self) -> Result<()>;
}

/// Creates subscriptions on a bus
#[async_trait]
pub trait BusConnector: Send + Sync {
    /// Register a handler under a consumer group
    async fn subscribe(
        &self,
        group_id: &str,
        config: &SubscriptionConfig,
        handler: Arc<dyn BatchHandler>,
        options: ConsumerOptions,
    ) -> Result<Box<dyn BusSubscription>>;
}

/// Connection and group settings for a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionConfig {
    /// Broker addresses
    pub hosts: Vec<String>,
    /// Metadata refresh interval (topic pattern re-evaluation)
    pub refresh_frequency: Duration,
    /// Where to start when the group has no committed offset
    pub offsets_initial: OffsetPolicy,
    /// Partition assignment strategy
    pub balance_strategy: BalanceStrategy,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["localhost:9092".into()],
            refresh_frequency: Duration::from_secs(10),
            offsets_initial: OffsetPolicy::Newest,
            balance_strategy: BalanceStrategy::Range,
        }
    }
}

/// Batch delivery options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerOptions {
    /// Deliver records in batches (false = one record per callback)
    pub batch_mode: bool,
    /// Maximum records per batch
    pub batch_max: usize,
}

impl ConsumerOptions {
    /// Batch mode with the given maximum batch size
    pub fn batched(batch_max: usize) -> Self {
        Self {
            batch_mode: true,
            batch_max,
        }
    }

    /// Effective number of records per callback
    #[inline]
    pub fn effective_batch_size(&self) -> usize {
        if self.batch_mode {
            self.batch_max.max(1)
        } else {
            1
        }
    }
}

impl Default for ConsumerOptions {
    fn default() -> Self {
        Self::batched(500)
    }
}

/// Which topics a subscription reads
#[derive(Clone)]
pub enum TopicSelector {
    /// Exact topic names
    Topics(Vec<String>),
    /// Every topic whose name matches the pattern
    Pattern(Regex),
}

impl TopicSelector {
    /// Select a single topic by name
    pub fn topic(name: impl Into<String>) -> Self {
        Self::Topics(vec![name.into()])
    }

    /// Select topics by regex pattern
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|source| BusError::InvalidTopicPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Check if a topic is selected
    pub fn matches(&self, topic: &str) -> bool {
        match self {
            Self::Topics(names) => names.iter().any(|n| n == topic),
            Self::Pattern(re) => re.is_match(topic),
        }
    }
}

impl fmt::Debug for TopicSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topics(names) => f.debug_tuple("Topics").field(names).finish(),
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
        }
    }
}

impl fmt::Display for TopicSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topics(names) => write!(f, "{}", names.join(",")),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}
