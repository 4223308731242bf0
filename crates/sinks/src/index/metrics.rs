//! Index sink metrics
//!
//! Atomic counters for tracking indexing throughput and failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for the index sink pipeline
#[derive(Debug, Default)]
pub struct IndexMetrics {
    /// Batches delivered by the bus
    pub batches_received: AtomicU64,

    /// Raw records across all batches
    pub records_received: AtomicU64,

    /// Records dropped for lacking a valid header
    pub malformed: AtomicU64,

    /// Bulk requests sent
    pub bulk_requests: AtomicU64,

    /// Bulk requests that failed at the transport level
    pub bulk_errors: AtomicU64,

    /// Documents the backend accepted
    pub documents_created: AtomicU64,

    /// Documents the backend rejected inside a completed bulk request
    pub documents_failed: AtomicU64,
}

impl IndexMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            batches_received: AtomicU64::new(0),
            records_received: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            bulk_requests: AtomicU64::new(0),
            bulk_errors: AtomicU64::new(0),
            documents_created: AtomicU64::new(0),
            documents_failed: AtomicU64::new(0),
        }
    }

    /// Record a batch received
    #[inline]
    pub fn record_batch(&self, records: u64, malformed: u64) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
        self.records_received.fetch_add(records, Ordering::Relaxed);
        self.malformed.fetch_add(malformed, Ordering::Relaxed);
    }

    /// Record a completed bulk request
    #[inline]
    pub fn record_bulk(&self, created: u64, failed: u64) {
        self.bulk_requests.fetch_add(1, Ordering::Relaxed);
        self.documents_created.fetch_add(created, Ordering::Relaxed);
        self.documents_failed.fetch_add(failed, Ordering::Relaxed);
    }

    /// Record a bulk request that did not complete
    #[inline]
    pub fn record_bulk_error(&self) {
        self.bulk_requests.fetch_add(1, Ordering::Relaxed);
        self.bulk_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> IndexStats {
        IndexStats {
            batches_received: self.batches_received.load(Ordering::Relaxed),
            records_received: self.records_received.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            bulk_requests: self.bulk_requests.load(Ordering::Relaxed),
            bulk_errors: self.bulk_errors.load(Ordering::Relaxed),
            documents_created: self.documents_created.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of [`IndexMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub batches_received: u64,
    pub records_received: u64,
    pub malformed: u64,
    pub bulk_requests: u64,
    pub bulk_errors: u64,
    pub documents_created: u64,
    pub documents_failed: u64,
}
