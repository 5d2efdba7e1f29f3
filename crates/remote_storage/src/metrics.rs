//! Queue metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single queue
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Current queue length
    queue_len: AtomicUsize,
    /// Total samples delivered by the client
    sent_count: AtomicU64,
    /// Total samples in batches the client failed to send
    failed_count: AtomicU64,
    /// Total samples dropped because the queue was full or closed
    dropped_count: AtomicU64,
    /// Total samples discarded by write relabeling
    relabel_dropped_count: AtomicU64,
}

impl QueueMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn sent_count(&self) -> u64 {
        self.sent_count.load(Ordering::Relaxed)
    }

    pub fn add_sent(&self, n: u64) {
        self.sent_count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::Relaxed)
    }

    pub fn add_failed(&self, n: u64) {
        self.failed_count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn relabel_dropped_count(&self) -> u64 {
        self.relabel_dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_relabel_dropped_count(&self) {
        self.relabel_dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            queue_len: self.queue_len(),
            sent_count: self.sent_count(),
            failed_count: self.failed_count(),
            dropped_count: self.dropped_count(),
            relabel_dropped_count: self.relabel_dropped_count(),
        }
    }
}

/// Snapshot of queue metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueMetricsSnapshot {
    pub queue_len: usize,
    pub sent_count: u64,
    pub failed_count: u64,
    pub dropped_count: u64,
    pub relabel_dropped_count: u64,
}
