//! Process context
//!
//! Everything a service needs is carried explicitly in a [`ServiceContext`]
//! built once at startup: the validated config, the bus connector and the
//! search backend. There is no global state.

use std::sync::Arc;

use logship_bus::{BusConnector, ConsumerOptions, SubscriptionConfig};
use logship_config::Config;
use logship_protocol::OffsetPolicy;
use logship_sinks::{
    ElasticsearchClient, ElasticsearchConfig, IndexSinkConfig, SearchBackend,
};

use crate::error::Result;

/// Shared, read-only process context
#[derive(Clone)]
pub struct ServiceContext {
    config: Arc<Config>,
    connector: Arc<dyn BusConnector>,
    backend: Arc<dyn SearchBackend>,
}

impl ServiceContext {
    /// Create a context from already-built parts
    pub fn new(
        config: Config,
        connector: Arc<dyn BusConnector>,
        backend: Arc<dyn SearchBackend>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            connector,
            backend,
        }
    }

    /// Create a context that talks to the search nodes named in `[index]`
    pub fn from_config(config: Config, connector: Arc<dyn BusConnector>) -> Result<Self> {
        let es = ElasticsearchConfig::default()
            .with_urls(config.index.urls.clone())
            .with_request_timeout(config.index.request_timeout);
        let backend = Arc::new(ElasticsearchClient::new(&es)?);

        Ok(Self::new(config, connector, backend))
    }

    /// Get reference to config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bus connector
    pub fn connector(&self) -> Arc<dyn BusConnector> {
        Arc::clone(&self.connector)
    }

    /// Search backend
    pub fn backend(&self) -> Arc<dyn SearchBackend> {
        Arc::clone(&self.backend)
    }

    /// Bus settings for a subscription starting at `offsets_initial`
    pub fn subscription_config(&self, offsets_initial: OffsetPolicy) -> SubscriptionConfig {
        let bus = &self.config.bus;
        SubscriptionConfig {
            hosts: bus.brokers.clone(),
            refresh_frequency: bus.refresh_frequency,
            offsets_initial,
            balance_strategy: bus.balance_strategy,
        }
    }

    /// Index sink settings from `[bus]` and `[index]`
    pub fn index_sink_config(&self) -> IndexSinkConfig {
        let bus = &self.config.bus;
        let index = &self.config.index;

        IndexSinkConfig {
            group_id: bus.group_id.clone(),
            topic_pattern: bus.topic_pattern.clone(),
            subscription: self.subscription_config(bus.offsets_initial),
            options: ConsumerOptions {
                batch_mode: bus.batch_mode,
                batch_max: bus.batch_max,
            },
            index_name: index.index_name.clone(),
            shards: index.shards,
            replicas: index.replicas,
            ..IndexSinkConfig::default()
        }
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("brokers", &self.config.bus.brokers)
            .field("index", &self.config.index.index_name)
            .finish_non_exhaustive()
    }
}
