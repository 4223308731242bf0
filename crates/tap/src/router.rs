//! LiveTailRouter - one live-follow stream
//!
//! A router owns one bus subscription for the lifetime of a follow request.
//! Every delivered batch is parsed, filtered against the request's
//! [`FilterCriteria`], grouped by log file and sent as a single
//! [`FollowReply`]:
//!
//! ```text
//! Bus ──batch──→ parse ──→ FilterCriteria ──→ group by file ──→ ReplyStream
//!                  │              │                  │
//!              malformed      no match         empty: no reply
//!               dropped       dropped
//! ```
//!
//! The batch callback does not return before the reply has been sent, so a
//! slow client slows the subscription down. Nothing is queued in between.
//!
//! # Termination
//!
//! `run` returns when the cancellation token fires, when the subscription
//! stops on its own, or when a send fails. On every path the subscription
//! is closed exactly once before `run` returns.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use logship_bus::{
    BatchHandler, BusConnector, BusError, ConsumerOptions, HandlerError, SubscriptionConfig,
    TopicSelector,
};
use logship_protocol::{FollowReply, RawRecord, parse};

use crate::error::{Result, TapError};
use crate::filter::FilterCriteria;
use crate::stream::ReplyStream;

/// Default time to let an in-flight batch finish after cancellation
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Bus parameters for a router's subscription
///
/// Passed through to the bus unchanged.
#[derive(Debug, Clone)]
pub struct SubscriptionParams {
    /// Consumer group
    pub group_id: String,
    /// Topic to follow
    pub topic: String,
    /// Connection and offset settings
    pub config: SubscriptionConfig,
    /// Batch delivery options
    pub options: ConsumerOptions,
}

/// Live-follow router for one request
pub struct LiveTailRouter {
    connector: Arc<dyn BusConnector>,
    params: SubscriptionParams,
    handler: Arc<TailHandler>,
    drain_timeout: Duration,
}

impl LiveTailRouter {
    /// Create a router; nothing is subscribed until [`run`](Self::run)
    pub fn new(
        criteria: FilterCriteria,
        stream: Arc<dyn ReplyStream>,
        connector: Arc<dyn BusConnector>,
        params: SubscriptionParams,
    ) -> Self {
        let handler = Arc::new(TailHandler {
            topic: params.topic.clone(),
            criteria,
            stream,
            metrics: Arc::new(TailMetrics::new()),
        });

        Self {
            connector,
            params,
            handler,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Set how long an in-flight batch may take to finish after cancellation
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Metrics handle, valid after `run` consumes the router
    pub fn metrics(&self) -> Arc<TailMetrics> {
        Arc::clone(&self.handler.metrics)
    }

    /// Filter this router applies
    pub fn criteria(&self) -> &FilterCriteria {
        &self.handler.criteria
    }

    /// Subscribe and stream replies until cancelled or failed
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let SubscriptionParams {
            group_id,
            topic,
            config,
            options,
        } = &self.params;

        let handler: Arc<dyn BatchHandler> = Arc::clone(&self.handler) as Arc<dyn BatchHandler>;
        let subscription = self
            .connector
            .subscribe(group_id, config, handler, *options)
            .await?;

        info!(
            instance_id = %self.handler.criteria.instance_id(),
            log_file = ?self.handler.criteria.log_file_name(),
            %topic,
            %group_id,
            "live tail started"
        );

        let topics = TopicSelector::topic(topic.clone());
        let run = subscription.run(&topics);
        tokio::pin!(run);

        let finished = tokio::select! {
            result = &mut run => Some(result),
            _ = cancel.cancelled() => None,
        };

        let closed = subscription.close().await;
        if let Err(ref e) = closed {
            warn!(%group_id, error = %e, "failed to close subscription");
        }

        let result = match finished {
            Some(result) => result,
            // Closed above, so the in-flight batch finishes and run returns
            None => match tokio::time::timeout(self.drain_timeout, &mut run).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(%group_id, timeout = ?self.drain_timeout, "subscription did not stop in time");
                    Ok(())
                }
            },
        };

        let result = result.map_err(into_tap_error).and(closed.map_err(TapError::from));

        let stats = self.handler.metrics.snapshot();
        match &result {
            Ok(()) => info!(
                instance_id = %self.handler.criteria.instance_id(),
                batches = stats.batches,
                replies = stats.replies_sent,
                "live tail stopped"
            ),
            Err(e) => warn!(
                instance_id = %self.handler.criteria.instance_id(),
                error = %e,
                "live tail failed"
            ),
        }

        result
    }
}

/// Unwrap a router error that travelled through the bus as a handler error
fn into_tap_error(err: BusError) -> TapError {
    match err {
        BusError::Handler(source) => match source.downcast::<TapError>() {
            Ok(tap) => *tap,
            Err(source) => TapError::Bus(BusError::Handler(source)),
        },
        other => TapError::Bus(other),
    }
}

/// Batch callback registered with the bus
struct TailHandler {
    /// Echoed back in every reply
    topic: String,
    criteria: FilterCriteria,
    stream: Arc<dyn ReplyStream>,
    metrics: Arc<TailMetrics>,
}

impl TailHandler {
    /// Parse, filter and group one batch
    ///
    /// Returns `None` when no record matched.
    fn aggregate(&self, records: &[RawRecord]) -> Option<FollowReply> {
        let mut log_files: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut malformed = 0u64;
        let mut matched = 0u64;

        for record in records {
            let Ok(parsed) = parse(record.value()) else {
                malformed += 1;
                trace!(
                    topic = record.topic(),
                    partition = record.partition(),
                    offset = record.offset(),
                    "dropping malformed record"
                );
                continue;
            };

            if !self.criteria.matches(&parsed) {
                continue;
            }

            matched += 1;
            log_files
                .entry(parsed.log_file_name)
                .or_default()
                .push(parsed.body);
        }

        self.metrics
            .record_batch(records.len() as u64, malformed, matched);

        if log_files.is_empty() {
            return None;
        }

        Some(FollowReply {
            topic: self.topic.clone(),
            instance_id: self.criteria.instance_id().to_string(),
            log_files,
        })
    }
}

#[async_trait]
impl BatchHandler for TailHandler {
    async fn handle_batch(&self, records: &[RawRecord]) -> std::result::Result<(), HandlerError> {
        let Some(reply) = self.aggregate(records) else {
            return Ok(());
        };

        let lines = reply.line_count();
        if let Err(e) = self.stream.send(reply).await {
            self.metrics.record_send_failed();
            return Err(Box::new(e));
        }

        self.metrics.record_reply();
        debug!(instance_id = %self.criteria.instance_id(), lines, "sent follow reply");
        Ok(())
    }
}

/// Counters for one live-follow stream
///
/// All counters use relaxed ordering.
#[derive(Debug, Default)]
pub struct TailMetrics {
    /// Batches delivered by the bus
    batches: AtomicU64,
    /// Records across all batches
    records: AtomicU64,
    /// Records without a valid header
    malformed: AtomicU64,
    /// Records that passed the filter
    matched: AtomicU64,
    /// Replies delivered to the stream
    replies_sent: AtomicU64,
    /// Failed sends (at most one per stream)
    send_failures: AtomicU64,
}

impl TailMetrics {
    /// Create metrics with all counters at zero
    pub const fn new() -> Self {
        Self {
            batches: AtomicU64::new(0),
            records: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            matched: AtomicU64::new(0),
            replies_sent: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    fn record_batch(&self, records: u64, malformed: u64, matched: u64) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.records.fetch_add(records, Ordering::Relaxed);
        self.malformed.fetch_add(malformed, Ordering::Relaxed);
        self.matched.fetch_add(matched, Ordering::Relaxed);
    }

    #[inline]
    fn record_reply(&self) {
        self.replies_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_send_failed(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot
    pub fn snapshot(&self) -> TailStats {
        TailStats {
            batches: self.batches.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`TailMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TailStats {
    pub batches: u64,
    pub records: u64,
    pub malformed: u64,
    pub matched: u64,
    pub replies_sent: u64,
    pub send_failures: u64,
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
