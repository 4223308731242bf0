//! Tests for LogService

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::timeout;

use logship_bus::MemoryBus;
use logship_config::Config;
use logship_protocol::{IndexDocument, OffsetPolicy};
use logship_sinks::{BulkResponse, SearchBackend, SearchResult};

use logship_tap::TapError;

use super::*;

/// Backend that accepts everything and remembers what it was asked
#[derive(Default)]
struct RecordingBackend {
    index_exists: bool,
    created: Mutex<Vec<(String, Value)>>,
    bulks: Mutex<Vec<Vec<IndexDocument>>>,
}

#[async_trait]
impl SearchBackend for RecordingBackend {
    async fn ping(&self) -> SearchResult<()> {
        Ok(())
    }

    async fn index_exists(&self, _index: &str) -> SearchResult<bool> {
        Ok(self.index_exists)
    }

    async fn create_index(&self, index: &str, body: &Value) -> SearchResult<()> {
        self.created.lock().push((index.to_string(), body.clone()));
        Ok(())
    }

    async fn bulk_create(&self, _index: &str, docs: &[IndexDocument]) -> SearchResult<BulkResponse> {
        self.bulks.lock().push(docs.to_vec());
        Ok(BulkResponse::all_created(docs.len()))
    }
}

fn service_with(toml: &str) -> (LogService, MemoryBus, Arc<RecordingBackend>) {
    let config = Config::from_str(toml).unwrap();
    let bus = MemoryBus::new();
    let backend = Arc::new(RecordingBackend::default());
    let ctx = ServiceContext::new(config, Arc::new(bus.clone()), backend.clone());
    (LogService::new(Arc::new(ctx)), bus, backend)
}

fn service() -> (LogService, MemoryBus, Arc<RecordingBackend>) {
    service_with(
        r#"
[bus]
brokers = ["kafka-1:9092"]
balance_strategy = "sticky"
topic_pattern = "^flow-"
offsets_initial = "oldest"

[index]
index_name = "flow-logs"
shards = 2
replicas = 0

[follow]
topic = "flow-live"
group_id_prefix = "tail"
default_batch_size = 10
max_batch_size = 50
drain_timeout = "1s"
"#,
    )
}

// ============================================================================
// Follow parameters
// ============================================================================

#[test]
fn test_follow_rejects_empty_instance() {
    let (svc, _, _) = service();
    let err = svc.follow_params(&FollowRequest::default()).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidRequest(_)));
}

#[test]
fn test_follow_defaults_topic_and_group() {
    let (svc, _, _) = service();
    let params = svc.follow_params(&FollowRequest::new("inst-1")).unwrap();

    assert_eq!(params.topic, "flow-live");
    assert!(params.group_id.starts_with("tail-inst-1-"));
    assert_eq!(params.options.batch_max, 10);
    assert_eq!(params.config.hosts, vec!["kafka-1:9092"]);
    assert_eq!(params.config.offsets_initial, OffsetPolicy::Newest);
}

#[test]
fn test_follow_groups_are_unique_per_request() {
    let (svc, _, _) = service();
    let a = svc.follow_params(&FollowRequest::new("inst-1")).unwrap();
    let b = svc.follow_params(&FollowRequest::new("inst-1")).unwrap();
    assert_ne!(a.group_id, b.group_id);
}

#[test]
fn test_follow_overrides() {
    let (svc, _, _) = service();
    let request = FollowRequest::new("inst-1")
        .with_topic("flow-other")
        .with_group_id("pinned")
        .with_offsets_initial(OffsetPolicy::Oldest)
        .with_batch_size(25);
    let params = svc.follow_params(&request).unwrap();

    assert_eq!(params.topic, "flow-other");
    assert_eq!(params.group_id, "pinned");
    assert_eq!(params.config.offsets_initial, OffsetPolicy::Oldest);
    assert_eq!(params.options.batch_max, 25);
}

#[test]
fn test_follow_empty_overrides_fall_back() {
    let (svc, _, _) = service();
    let request = FollowRequest::new("inst-1").with_topic("").with_group_id("");
    let params = svc.follow_params(&request).unwrap();

    assert_eq!(params.topic, "flow-live");
    assert!(params.group_id.starts_with("tail-inst-1-"));
}

#[test]
fn test_follow_batch_size_clamped() {
    let (svc, _, _) = service();
    let params = svc
        .follow_params(&FollowRequest::new("inst-1").with_batch_size(10_000))
        .unwrap();
    assert_eq!(params.options.batch_max, 50);
}

// ============================================================================
// Follow stream
// ============================================================================

#[tokio::test]
async fn test_follow_streams_matching_lines() {
    let (svc, bus, _) = service();
    bus.publish("flow-live", "[1][inst-1][app.log] first");
    bus.publish("flow-live", "[2][inst-2][app.log] other");

    let (tx, mut rx) = mpsc::channel(4);
    let cancel = CancellationToken::new();
    let request = FollowRequest::new("inst-1").with_offsets_initial(OffsetPolicy::Oldest);

    let task = {
        let svc = svc.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { svc.follow(request, Arc::new(tx), cancel).await })
    };

    let reply = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
    assert_eq!(reply.topic, "flow-live");
    assert_eq!(reply.instance_id, "inst-1");
    assert_eq!(reply.log_files["app.log"], vec!["first"]);

    cancel.cancel();
    let stats = timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(stats.replies_sent, 1);
    assert_eq!(stats.matched, 1);
}

#[tokio::test]
async fn test_follow_ends_when_client_goes_away() {
    let (svc, bus, _) = service();
    bus.publish("flow-live", "[1][inst-1][app.log] first");

    let (tx, rx) = mpsc::channel(4);
    drop(rx);

    let request = FollowRequest::new("inst-1").with_offsets_initial(OffsetPolicy::Oldest);
    let result = timeout(
        Duration::from_secs(2),
        svc.follow(request, Arc::new(tx), CancellationToken::new()),
    )
    .await
    .unwrap();

    assert!(matches!(result, Err(ServiceError::Tap(TapError::Send(_)))));
}

#[tokio::test]
async fn test_follow_invalid_request_does_not_subscribe() {
    let (svc, bus, _) = service();
    bus.publish("flow-live", "[1][inst-1][app.log] first");

    let (tx, _rx) = mpsc::channel(4);
    let result = svc
        .follow(FollowRequest::default(), Arc::new(tx), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidRequest(_))));
}

// ============================================================================
// Indexer
// ============================================================================

#[test]
fn test_index_sink_config_from_sections() {
    let (svc, _, _) = service();
    let config = svc.context().index_sink_config();

    assert_eq!(config.group_id, "logship-indexer");
    assert_eq!(config.topic_pattern, "^flow-");
    assert_eq!(config.index_name, "flow-logs");
    assert_eq!(config.shards, 2);
    assert_eq!(config.replicas, 0);
    assert_eq!(config.subscription.offsets_initial, OffsetPolicy::Oldest);
    assert_eq!(
        config.subscription.balance_strategy,
        logship_protocol::BalanceStrategy::Sticky
    );
    assert!(config.options.batch_mode);
}

#[test]
fn test_index_disabled() {
    let (svc, _, _) = service_with("[index]\nenabled = false");
    assert!(matches!(
        svc.index_pipeline(),
        Err(ServiceError::IndexDisabled)
    ));
}

#[tokio::test]
async fn test_init_index_creates_missing_index() {
    let (svc, _, backend) = service();
    assert!(svc.init_index().await.unwrap());

    let created = backend.created.lock();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0, "flow-logs");
    assert_eq!(created[0].1["settings"]["number_of_shards"], 2);
}

#[tokio::test]
async fn test_run_indexer_writes_matching_topics() {
    let (svc, bus, backend) = service();
    bus.publish("flow-a", "[5][inst-1][app.log] indexed");
    bus.publish("audit", "[6][inst-1][app.log] skipped");

    let cancel = CancellationToken::new();
    let task = {
        let svc = svc.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { svc.run_indexer(cancel).await })
    };

    timeout(Duration::from_secs(2), async {
        while backend.bulks.lock().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    cancel.cancel();
    let stats = timeout(Duration::from_secs(2), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let bulks = backend.bulks.lock();
    assert_eq!(bulks.len(), 1);
    assert_eq!(bulks[0][0].log_entry, "indexed");
    assert_eq!(bulks[0][0].created, 5);
    assert_eq!(stats.documents_created, 1);
}
