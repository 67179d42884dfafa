use std::sync::atomic::{AtomicU64, Ordering};

use kvp_core::CloseReason;

/// Lock-free counters shared between the ingest task and readers.
#[derive(Debug, Default)]
pub(crate) struct SupplierMetrics {
    updates_received: AtomicU64,
    updates_applied: AtomicU64,
    updates_discarded: AtomicU64,
    batches_by_size: AtomicU64,
    batches_by_latency: AtomicU64,
    batches_by_drain: AtomicU64,
}

impl SupplierMetrics {
    pub(crate) fn inc_received(&self) {
        self.updates_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_batch(&self, reason: CloseReason, updates: usize) {
        self.updates_applied
            .fetch_add(updates as u64, Ordering::Relaxed);
        let counter = match reason {
            CloseReason::Size => &self.batches_by_size,
            CloseReason::Latency => &self.batches_by_latency,
            CloseReason::Drain => &self.batches_by_drain,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_discarded(&self, updates: usize) {
        self.updates_discarded
            .fetch_add(updates as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            updates_received: self.updates_received.load(Ordering::Relaxed),
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            updates_discarded: self.updates_discarded.load(Ordering::Relaxed),
            batches_by_size: self.batches_by_size.load(Ordering::Relaxed),
            batches_by_latency: self.batches_by_latency.load(Ordering::Relaxed),
            batches_by_drain: self.batches_by_drain.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the supplier counters.
///
/// Counters are read independently; a snapshot taken while a batch is being
/// published may be off by that one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub updates_received: u64,
    pub updates_applied: u64,
    /// Updates dropped with their window on cancellation or source failure.
    pub updates_discarded: u64,
    pub batches_by_size: u64,
    pub batches_by_latency: u64,
    pub batches_by_drain: u64,
}

impl MetricsSnapshot {
    pub fn batches_applied(&self) -> u64 {
        self.batches_by_size + self.batches_by_latency + self.batches_by_drain
    }

    /// Updates received but not yet applied or discarded.
    pub fn updates_pending(&self) -> u64 {
        self.updates_received
            .saturating_sub(self.updates_applied + self.updates_discarded)
    }
}
