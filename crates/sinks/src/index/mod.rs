//! Index sink - bus records into the search index
//!
//! One long-lived [`IndexSinkPipeline`] per process. It owns a single
//! subscription over a topic pattern and writes one bulk request per batch.

mod metrics;
mod pipeline;

pub use metrics::{IndexMetrics, IndexStats};
pub use pipeline::{DEFAULT_DRAIN_TIMEOUT, IndexSinkConfig, IndexSinkPipeline, ensure_index};
