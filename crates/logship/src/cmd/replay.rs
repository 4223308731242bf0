//! Replay command - index a file of raw records
//!
//! Publishes every line of the input onto an in-process bus and runs the
//! index pipeline over it with the settings from the config file, exactly as
//! records arriving from a real bus would be indexed. Stops once every
//! record has been consumed, or on Ctrl-C.
//!
//! With `--follow`, a live-follow stream for one instance runs alongside
//! and its replies are printed to stdout as JSON lines.
//!
//! # Usage
//!
//! ```bash
//! logship replay records.log
//! logship replay records.log --topic flow-app --follow web-1
//! logship replay records.log --follow web-1 --log-file access.log
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use logship_bus::{MemoryBus, TopicSelector};
use logship_config::Config;
use logship_pipeline::{LogService, ServiceContext};
use logship_protocol::{Bytes, FollowReply, FollowRequest, OffsetPolicy};
use logship_sinks::IndexMetrics;
use logship_tap::TailMetrics;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::parse::trim_line_end;

/// How often replay progress is checked
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Replay command arguments
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// File of raw records, one per line
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Topic to publish on (default: [follow].topic)
    #[arg(long)]
    topic: Option<String>,

    /// Follow one instance and print its replies
    #[arg(long, value_name = "INSTANCE_ID")]
    follow: Option<String>,

    /// Only follow this log file
    #[arg(long, requires = "follow")]
    log_file: Option<String>,
}

impl ReplayArgs {
    /// Whether follow replies are printed on stdout
    pub fn prints_replies(&self) -> bool {
        self.follow.is_some()
    }
}

/// Run the replay command
pub async fn run(args: ReplayArgs, mut config: Config) -> Result<()> {
    // Records are published before anyone subscribes
    config.bus.offsets_initial = OffsetPolicy::Oldest;

    let topic = args.topic.clone().unwrap_or_else(|| config.follow.topic.clone());
    let selector = TopicSelector::pattern(&config.bus.topic_pattern)?;
    if !selector.matches(&topic) {
        anyhow::bail!(
            "topic '{}' is not selected by [bus].topic_pattern {}",
            topic,
            selector
        );
    }

    let lines = read_records(&args.input)?;
    let total = lines.len() as u64;

    let bus = MemoryBus::new();
    for line in lines {
        bus.publish(&topic, line);
    }
    info!(records = total, %topic, input = %args.input.display(), "records published");

    let ctx = ServiceContext::from_config(config, Arc::new(bus))?;
    let service = LogService::new(Arc::new(ctx));
    let cancel = CancellationToken::new();

    let pipeline = Arc::new(service.index_pipeline()?);
    let index_metrics = pipeline.metrics();
    let mut indexer = {
        let pipeline = Arc::clone(&pipeline);
        let cancel = cancel.clone();
        tokio::spawn(async move { pipeline.run(cancel).await })
    };

    let follower = match &args.follow {
        Some(instance_id) => {
            let mut request = FollowRequest::new(instance_id.clone())
                .with_topic(topic.clone())
                .with_offsets_initial(OffsetPolicy::Oldest);
            if let Some(file) = &args.log_file {
                request = request.with_log_file(file.clone());
            }
            Some(spawn_follower(&service, &request, cancel.clone())?)
        }
        None => None,
    };

    let finished = tokio::select! {
        result = &mut indexer => Some(result),
        _ = wait_drained(&index_metrics, follower.as_ref().map(|f| f.metrics.as_ref()), total) => {
            info!("replay drained");
            None
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, stopping replay");
            None
        }
    };

    cancel.cancel();
    let result = match finished {
        Some(result) => result,
        None => indexer.await,
    };

    if let Some(follower) = follower {
        match follower.task.await.context("follow task panicked")? {
            Ok(()) => {}
            Err(e) => warn!(error = %e, "follow stream ended with error"),
        }
        follower.printer.await.context("output task panicked")??;
    }

    let stats = result
        .context("index task panicked")?
        .context("index pipeline failed")?;

    eprintln!(
        "{} records, {} indexed, {} failed, {} malformed",
        stats.records_received, stats.documents_created, stats.documents_failed, stats.malformed
    );
    Ok(())
}

/// Non-blank lines of the input file, as raw bytes
///
/// Lines are not decoded here; invalid UTF-8 reaches the pipeline unchanged
/// and is handled by the record parser like any bus payload.
fn read_records(path: &Path) -> Result<Vec<Bytes>> {
    let contents = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    Ok(contents
        .split(|&b| b == b'\n')
        .map(trim_line_end)
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .map(Bytes::copy_from_slice)
        .collect())
}

/// A running follow stream and the task printing its replies
struct Follower {
    task: JoinHandle<logship_tap::Result<()>>,
    printer: JoinHandle<Result<()>>,
    metrics: Arc<TailMetrics>,
}

fn spawn_follower(
    service: &LogService,
    request: &FollowRequest,
    cancel: CancellationToken,
) -> Result<Follower> {
    let (tx, rx) = mpsc::channel(64);
    let router = service.follow_router(request, Arc::new(tx))?;
    let metrics = router.metrics();

    info!(instance_id = %request.instance_id, log_file = ?request.log_file_name, "following");

    Ok(Follower {
        task: tokio::spawn(router.run(cancel)),
        printer: tokio::spawn(print_replies(rx)),
        metrics,
    })
}

/// Write replies as JSON lines until the stream's sender is dropped
async fn print_replies(mut rx: mpsc::Receiver<FollowReply>) -> Result<()> {
    while let Some(reply) = rx.recv().await {
        let mut out = io::stdout().lock();
        serde_json::to_writer(&mut out, &reply)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Resolve once the indexer (and follower, if any) have seen every record
async fn wait_drained(index: &IndexMetrics, tail: Option<&TailMetrics>, total: u64) {
    loop {
        let indexed = index.snapshot().records_received >= total;
        let followed = tail.is_none_or(|t| t.snapshot().records >= total);
        if indexed && followed {
            return;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
