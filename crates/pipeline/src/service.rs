//! LogService - the process-level entry points
//!
//! ```text
//! FollowRequest ──validate──→ resolve topic / group / batch ──→ LiveTailRouter::run
//! startup ──→ IndexSinkPipeline::run (ensure index, then consume)
//! ```
//!
//! Every follow request gets its own router and, unless the request names
//! one, its own consumer group, so each follower sees every partition of the
//! topic.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use logship_bus::ConsumerOptions;
use logship_protocol::FollowRequest;
use logship_sinks::{IndexSinkPipeline, IndexStats, ensure_index};
use logship_tap::{FilterCriteria, LiveTailRouter, ReplyStream, SubscriptionParams, TailStats};

use crate::context::ServiceContext;
use crate::error::{Result, ServiceError};

/// Follow and index entry points over one [`ServiceContext`]
#[derive(Debug, Clone)]
pub struct LogService {
    ctx: Arc<ServiceContext>,
}

impl LogService {
    /// Create a service
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Get reference to the context
    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Resolve the bus parameters of a follow request
    ///
    /// - topic: request override, else `[follow].topic`
    /// - group: request override, else `<prefix>-<instance>-<uuid>`
    /// - batch size: 0 means the configured default, clamped to the maximum
    pub fn follow_params(&self, request: &FollowRequest) -> Result<SubscriptionParams> {
        request.validate()?;
        let follow = &self.ctx.config().follow;

        let topic = match request.topic.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => follow.topic.clone(),
        };
        let group_id = match request.group_id.as_deref() {
            Some(g) if !g.is_empty() => g.to_string(),
            _ => format!(
                "{}-{}-{}",
                follow.group_id_prefix,
                request.instance_id,
                Uuid::new_v4()
            ),
        };
        let batch_size = follow.batch_size(request.batch_size);

        Ok(SubscriptionParams {
            group_id,
            topic,
            config: self.ctx.subscription_config(request.offsets_initial),
            options: ConsumerOptions::batched(batch_size as usize),
        })
    }

    /// Build the router for a follow request without starting it
    pub fn follow_router(
        &self,
        request: &FollowRequest,
        stream: Arc<dyn ReplyStream>,
    ) -> Result<LiveTailRouter> {
        let params = self.follow_params(request)?;
        let router = LiveTailRouter::new(
            FilterCriteria::from_request(request),
            stream,
            self.ctx.connector(),
            params,
        )
        .with_drain_timeout(self.ctx.config().follow.drain_timeout);
        Ok(router)
    }

    /// Serve one follow request until the client cancels or the stream fails
    pub async fn follow(
        &self,
        request: FollowRequest,
        stream: Arc<dyn ReplyStream>,
        cancel: CancellationToken,
    ) -> Result<TailStats> {
        let router = self.follow_router(&request, stream)?;
        let metrics = router.metrics();

        let result = router.run(cancel).await;
        let stats = metrics.snapshot();

        match result {
            Ok(()) => {
                info!(
                    instance_id = %request.instance_id,
                    replies = stats.replies_sent,
                    matched = stats.matched,
                    "follow request finished"
                );
                Ok(stats)
            }
            Err(e) => {
                warn!(instance_id = %request.instance_id, error = %e, "follow request failed");
                Err(e.into())
            }
        }
    }

    /// Build the index pipeline from `[bus]` and `[index]`
    pub fn index_pipeline(&self) -> Result<IndexSinkPipeline> {
        if !self.ctx.config().index.enabled {
            return Err(ServiceError::IndexDisabled);
        }
        Ok(IndexSinkPipeline::new(
            self.ctx.index_sink_config(),
            self.ctx.connector(),
            self.ctx.backend(),
        ))
    }

    /// Run only the index startup sequence; `true` if the index was created
    pub async fn init_index(&self) -> Result<bool> {
        let index = &self.ctx.config().index;
        let backend = self.ctx.backend();
        Ok(ensure_index(backend.as_ref(), &index.index_name, index.shards, index.replicas).await?)
    }

    /// Run the index pipeline until cancelled or failed
    pub async fn run_indexer(&self, cancel: CancellationToken) -> Result<IndexStats> {
        let pipeline = self.index_pipeline()?;
        Ok(pipeline.run(cancel).await?)
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
