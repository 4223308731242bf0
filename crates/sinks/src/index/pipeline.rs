//! Index sink pipeline
//!
//! Consumes every topic matching a pattern and bulk-writes each batch to the
//! search index:
//!
//! ```text
//! startup: ping ──→ index_exists ──no──→ create_index
//!                        │yes                 │
//!                        └────────┬───────────┘
//!                                 ▼
//! Bus ──batch──→ parse ──→ IndexDocument[] ──→ bulk_create (one request)
//!                  │                 │
//!             malformed         empty: no request
//!              dropped
//! ```
//!
//! Consumption never starts before the index is confirmed present. The batch
//! callback returns only after the bulk request completes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use logship_bus::{
    BatchHandler, BusConnector, BusError, BusSubscription, ConsumerOptions, HandlerError,
    SubscriptionConfig, TopicSelector,
};
use logship_protocol::{IndexDocument, RawRecord, parse};

use super::metrics::{IndexMetrics, IndexStats};
use crate::error::{Result, SinkError};
use crate::search::{SearchBackend, index_mapping};

/// Default time to let an in-flight batch finish after cancellation
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`IndexSinkPipeline`]
#[derive(Debug, Clone)]
pub struct IndexSinkConfig {
    /// Consumer group shared by all indexer processes
    pub group_id: String,
    /// Regex selecting the topics to index
    pub topic_pattern: String,
    /// Bus connection and offset settings
    pub subscription: SubscriptionConfig,
    /// Batch delivery options
    pub options: ConsumerOptions,
    /// Target index
    pub index_name: String,
    /// Primary shards for a newly created index
    pub shards: u32,
    /// Replicas for a newly created index
    pub replicas: u32,
    /// Time allowed for the in-flight batch after cancellation
    pub drain_timeout: Duration,
}

impl Default for IndexSinkConfig {
    fn default() -> Self {
        Self {
            group_id: "logship-indexer".into(),
            topic_pattern: ".*".into(),
            subscription: SubscriptionConfig::default(),
            options: ConsumerOptions::default(),
            index_name: "logship-logs".into(),
            shards: 1,
            replicas: 1,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

/// Verify the backend and make sure the index exists
///
/// Creates the index only when it is missing and returns `true` if it did.
/// Any failure is a startup failure.
pub async fn ensure_index(
    backend: &dyn SearchBackend,
    index: &str,
    shards: u32,
    replicas: u32,
) -> Result<bool> {
    let startup = |source| SinkError::Startup {
        index: index.to_string(),
        source,
    };

    backend.ping().await.map_err(startup)?;

    if backend.index_exists(index).await.map_err(startup)? {
        debug!(index, "index exists");
        return Ok(false);
    }

    backend
        .create_index(index, &index_mapping(shards, replicas))
        .await
        .map_err(startup)?;
    info!(index, shards, replicas, "index created");
    Ok(true)
}

/// Process-wide pipeline from the bus to the search index
pub struct IndexSinkPipeline {
    config: IndexSinkConfig,
    connector: Arc<dyn BusConnector>,
    handler: Arc<IndexHandler>,
    /// Open subscription, taken by `close`
    subscription: Mutex<Option<Arc<dyn BusSubscription>>>,
}

impl IndexSinkPipeline {
    /// Create a pipeline; nothing is contacted until [`run`](Self::run)
    pub fn new(
        config: IndexSinkConfig,
        connector: Arc<dyn BusConnector>,
        backend: Arc<dyn SearchBackend>,
    ) -> Self {
        let handler = Arc::new(IndexHandler {
            index_name: config.index_name.clone(),
            backend,
            metrics: Arc::new(IndexMetrics::new()),
        });

        Self {
            config,
            connector,
            handler,
            subscription: Mutex::new(None),
        }
    }

    /// Get reference to config
    pub fn config(&self) -> &IndexSinkConfig {
        &self.config
    }

    /// Metrics handle, shared with the batch callback
    pub fn metrics(&self) -> Arc<IndexMetrics> {
        Arc::clone(&self.handler.metrics)
    }

    /// Check if a subscription is open
    pub fn is_subscribed(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// Run the index startup sequence only; `true` if the index was created
    pub async fn ensure_index(&self) -> Result<bool> {
        ensure_index(
            self.handler.backend.as_ref(),
            &self.config.index_name,
            self.config.shards,
            self.config.replicas,
        )
        .await
    }

    /// Ensure the index, then consume until cancelled or failed
    ///
    /// The subscription is closed before this returns.
    pub async fn run(&self, cancel: CancellationToken) -> Result<IndexStats> {
        self.ensure_index().await?;

        let topics = TopicSelector::pattern(&self.config.topic_pattern)?;
        let handler: Arc<dyn BatchHandler> = Arc::clone(&self.handler) as Arc<dyn BatchHandler>;
        let subscription: Arc<dyn BusSubscription> = Arc::from(
            self.connector
                .subscribe(
                    &self.config.group_id,
                    &self.config.subscription,
                    handler,
                    self.config.options,
                )
                .await?,
        );
        *self.subscription.lock() = Some(Arc::clone(&subscription));

        info!(
            group_id = %self.config.group_id,
            topics = %topics,
            index = %self.config.index_name,
            batch_size = self.config.options.effective_batch_size(),
            "index sink starting"
        );

        let run = subscription.run(&topics);
        tokio::pin!(run);

        let finished = tokio::select! {
            result = &mut run => Some(result),
            _ = cancel.cancelled() => None,
        };

        let closed = self.close().await;

        let result = match finished {
            Some(result) => result,
            None => match tokio::time::timeout(self.config.drain_timeout, &mut run).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout = ?self.config.drain_timeout, "index subscription did not stop in time");
                    Ok(())
                }
            },
        };

        let snapshot = self.handler.metrics.snapshot();
        info!(
            batches = snapshot.batches_received,
            records = snapshot.records_received,
            malformed = snapshot.malformed,
            created = snapshot.documents_created,
            failed = snapshot.documents_failed,
            bulk_errors = snapshot.bulk_errors,
            "index sink shutting down"
        );

        result.map_err(into_sink_error)?;
        closed?;
        Ok(snapshot)
    }

    /// Close the subscription
    ///
    /// Safe to call more than once and before `run` ever subscribed.
    pub async fn close(&self) -> Result<()> {
        let subscription = self.subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.close().await?;
            debug!(group_id = %self.config.group_id, "index subscription closed");
        }
        Ok(())
    }
}

/// Unwrap a sink error that travelled through the bus as a handler error
fn into_sink_error(err: BusError) -> SinkError {
    match err {
        BusError::Handler(source) => match source.downcast::<SinkError>() {
            Ok(sink) => *sink,
            Err(source) => SinkError::Bus(BusError::Handler(source)),
        },
        other => SinkError::Bus(other),
    }
}

/// Batch callback registered with the bus
struct IndexHandler {
    index_name: String,
    backend: Arc<dyn SearchBackend>,
    metrics: Arc<IndexMetrics>,
}

impl IndexHandler {
    /// Parse a batch into documents, dropping malformed records
    fn documents(&self, records: &[RawRecord]) -> Vec<IndexDocument> {
        let mut malformed = 0u64;
        let docs: Vec<IndexDocument> = records
            .iter()
            .filter_map(|record| match parse(record.value()) {
                Ok(parsed) => Some(IndexDocument::from(parsed)),
                Err(_) => {
                    malformed += 1;
                    trace!(
                        topic = record.topic(),
                        partition = record.partition(),
                        offset = record.offset(),
                        "dropping malformed record"
                    );
                    None
                }
            })
            .collect();

        self.metrics.record_batch(records.len() as u64, malformed);
        docs
    }
}

#[async_trait]
impl BatchHandler for IndexHandler {
    async fn handle_batch(&self, records: &[RawRecord]) -> std::result::Result<(), HandlerError> {
        let docs = self.documents(records);
        if docs.is_empty() {
            return Ok(());
        }

        let response = match self.backend.bulk_create(&self.index_name, &docs).await {
            Ok(response) => response,
            Err(e) => {
                self.metrics.record_bulk_error();
                error!(index = %self.index_name, documents = docs.len(), error = %e, "bulk request failed");
                return Err(Box::new(SinkError::Bulk(e)));
            }
        };

        self.metrics
            .record_bulk(response.created() as u64, response.failures.len() as u64);

        if let Some(first) = response.failures.first() {
            warn!(
                index = %self.index_name,
                failed = response.failures.len(),
                documents = docs.len(),
                status = first.status,
                kind = %first.kind,
                reason = %first.reason,
                "bulk request had rejected documents"
            );
        } else {
            debug!(index = %self.index_name, documents = docs.len(), took_ms = response.took_ms, "bulk request done");
        }

        Ok(())
    }
}
