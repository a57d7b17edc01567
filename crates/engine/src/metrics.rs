//! Engine and sink metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for the record pipeline
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Total records accepted into the queue
    records_enqueued: AtomicU64,
    /// Total records rejected by schema validation
    records_invalid: AtomicU64,
    /// Total batches drained and dispatched
    batches_dispatched: AtomicU64,
    /// Total failed device polls
    fetch_failures: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records_enqueued(&self) -> u64 {
        self.records_enqueued.load(Ordering::Relaxed)
    }

    pub fn inc_records_enqueued(&self) {
        self.records_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn records_invalid(&self) -> u64 {
        self.records_invalid.load(Ordering::Relaxed)
    }

    pub fn inc_records_invalid(&self) {
        self.records_invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn batches_dispatched(&self) -> u64 {
        self.batches_dispatched.load(Ordering::Relaxed)
    }

    pub fn inc_batches_dispatched(&self) {
        self.batches_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_failures(&self) -> u64 {
        self.fetch_failures.load(Ordering::Relaxed)
    }

    pub fn inc_fetch_failures(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Commit tasks currently in flight
    inflight: AtomicUsize,
    /// Total successful batch commits
    commit_count: AtomicU64,
    /// Total failed batch commits
    failure_count: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::Relaxed)
    }

    pub fn set_inflight(&self, n: usize) {
        self.inflight.store(n, Ordering::Relaxed);
    }

    pub fn commit_count(&self) -> u64 {
        self.commit_count.load(Ordering::Relaxed)
    }

    pub fn inc_commit_count(&self) {
        self.commit_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inflight: self.inflight(),
            commit_count: self.commit_count(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub inflight: usize,
    pub commit_count: u64,
    pub failure_count: u64,
}
