//! End-to-end tests for logship
//!
//! Runs the index sink and live-follow streams side by side over one
//! in-process bus, the way a single process serves both.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use logship_bus::MemoryBus;
use logship_config::Config;
use logship_pipeline::{LogService, ServiceContext};
use logship_protocol::{FollowReply, FollowRequest, IndexDocument, OffsetPolicy};
use logship_sinks::{BulkResponse, SearchBackend, SearchResult};

const CONFIG: &str = r#"
[bus]
topic_pattern = "^flow-"
offsets_initial = "oldest"
batch_max = 100

[index]
index_name = "flow-logs"

[follow]
topic = "flow-app"
drain_timeout = "1s"
"#;

/// Search backend keeping every document in memory
#[derive(Default)]
struct InMemoryIndex {
    docs: Mutex<Vec<IndexDocument>>,
    created: Mutex<bool>,
}

#[async_trait]
impl SearchBackend for InMemoryIndex {
    async fn ping(&self) -> SearchResult<()> {
        Ok(())
    }

    async fn index_exists(&self, _index: &str) -> SearchResult<bool> {
        Ok(*self.created.lock())
    }

    async fn create_index(&self, _index: &str, _body: &Value) -> SearchResult<()> {
        *self.created.lock() = true;
        Ok(())
    }

    async fn bulk_create(&self, _index: &str, docs: &[IndexDocument]) -> SearchResult<BulkResponse> {
        self.docs.lock().extend_from_slice(docs);
        Ok(BulkResponse::all_created(docs.len()))
    }
}

fn setup() -> (LogService, MemoryBus, Arc<InMemoryIndex>) {
    let bus = MemoryBus::new();
    let index = Arc::new(InMemoryIndex::default());
    let ctx = ServiceContext::new(
        Config::from_str(CONFIG).unwrap(),
        Arc::new(bus.clone()),
        index.clone(),
    );
    (LogService::new(Arc::new(ctx)), bus, index)
}

async fn wait_for_docs(index: &InMemoryIndex, count: usize) {
    timeout(Duration::from_secs(3), async {
        while index.docs.lock().len() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("documents were not indexed in time");
}

async fn next_reply(rx: &mut mpsc::Receiver<FollowReply>) -> FollowReply {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for reply")
        .expect("reply stream closed")
}

#[tokio::test]
async fn test_index_and_follow_share_the_bus() {
    let (service, bus, index) = setup();
    bus.create_topic("flow-app", 2);

    let cancel = CancellationToken::new();

    let indexer = {
        let service = service.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { service.run_indexer(cancel).await })
    };

    let (tx, mut rx) = mpsc::channel(16);
    let follower = {
        let service = service.clone();
        let cancel = cancel.clone();
        let request = FollowRequest::new("web-1")
            .with_log_file("access.log")
            .with_offsets_initial(OffsetPolicy::Oldest);
        tokio::spawn(async move { service.follow(request, Arc::new(tx), cancel).await })
    };

    bus.publish_to("flow-app", 0, "[100][web-1][access.log] GET /").unwrap();
    bus.publish_to("flow-app", 1, "[101][web-1][error.log] boom").unwrap();
    bus.publish_to("flow-app", 1, "[102][web-2][access.log] GET /other").unwrap();
    bus.publish_to("flow-app", 0, "not a log line").unwrap();

    let reply = next_reply(&mut rx).await;
    assert_eq!(reply.instance_id, "web-1");
    assert_eq!(reply.log_files.len(), 1);
    assert_eq!(reply.log_files["access.log"], vec!["GET /"]);

    // Three well-formed lines indexed, the malformed one dropped
    wait_for_docs(&index, 3).await;
    assert!(*index.created.lock());

    cancel.cancel();
    let follow_stats = follower.await.unwrap().unwrap();
    let index_stats = indexer.await.unwrap().unwrap();

    assert_eq!(follow_stats.malformed, 1);
    assert_eq!(follow_stats.matched, 1);
    assert_eq!(index_stats.malformed, 1);
    assert_eq!(index_stats.documents_created, 3);

    let mut created: Vec<i64> = index.docs.lock().iter().map(|d| d.created).collect();
    created.sort_unstable();
    assert_eq!(created, vec![100, 101, 102]);
}

#[tokio::test]
async fn test_each_follower_sees_every_record() {
    let (service, bus, _) = setup();
    bus.publish("flow-app", "[1][web-1][app.log] one");
    bus.publish("flow-app", "[2][web-1][app.log] two");

    let cancel = CancellationToken::new();
    let mut receivers = Vec::new();
    let mut tasks = Vec::new();

    for _ in 0..2 {
        let (tx, rx) = mpsc::channel(16);
        receivers.push(rx);

        let service = service.clone();
        let cancel = cancel.clone();
        let request = FollowRequest::new("web-1").with_offsets_initial(OffsetPolicy::Oldest);
        tasks.push(tokio::spawn(async move {
            service.follow(request, Arc::new(tx), cancel).await
        }));
    }

    for rx in &mut receivers {
        let reply = next_reply(rx).await;
        assert_eq!(reply.log_files["app.log"], vec!["one", "two"]);
    }

    cancel.cancel();
    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }
}
