use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use kvp_core::Snapshot;

/// The value [`SnapshotReader::last_successful_update`] reports until the
/// first latency-closed window.
pub fn start_of_time() -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(0)
}

// ---------------------------------------------------------------------------
// SnapshotView — the published cell
// ---------------------------------------------------------------------------

/// The single shared cell: current snapshot plus the interval-close clock.
///
/// Only the ingest task writes; every write is a pointer swap or an atomic
/// store, so readers never wait.
pub(crate) struct SnapshotView<K, V> {
    current: ArcSwap<Snapshot<K, V>>,
    /// Nanoseconds since the Unix epoch of the last latency-triggered close.
    last_interval_close: AtomicI64,
}

impl<K, V> SnapshotView<K, V> {
    pub(crate) fn new(initial: Snapshot<K, V>) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
            last_interval_close: AtomicI64::new(0),
        }
    }

    pub(crate) fn load(&self) -> Arc<Snapshot<K, V>> {
        self.current.load_full()
    }

    pub(crate) fn publish(&self, next: Snapshot<K, V>) {
        self.current.store(Arc::new(next));
    }

    pub(crate) fn mark_interval_close(&self, at: DateTime<Utc>) {
        let nanos = at.timestamp_nanos_opt().unwrap_or(i64::MAX);
        self.last_interval_close.store(nanos, Ordering::Release);
    }

    pub(crate) fn last_interval_close(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.last_interval_close.load(Ordering::Acquire))
    }
}

// ---------------------------------------------------------------------------
// SnapshotReader — cloneable read handle
// ---------------------------------------------------------------------------

/// Cheap, cloneable read-only handle on a supplier's snapshot.
///
/// Outlives the supplier: once the supplier is closed the reader keeps
/// returning the last published snapshot.
pub struct SnapshotReader<K, V> {
    view: Arc<SnapshotView<K, V>>,
}

impl<K, V> SnapshotReader<K, V> {
    pub(crate) fn new(view: Arc<SnapshotView<K, V>>) -> Self {
        Self { view }
    }

    /// The latest published snapshot. Never blocks.
    pub fn get(&self) -> Arc<Snapshot<K, V>> {
        self.view.load()
    }

    /// When a window last closed because `max_latency` elapsed.
    ///
    /// Windows closed by size or drained at source end do not move it.
    pub fn last_successful_update(&self) -> DateTime<Utc> {
        self.view.last_interval_close()
    }
}

impl<K, V> Clone for SnapshotReader<K, V> {
    fn clone(&self) -> Self {
        Self {
            view: Arc::clone(&self.view),
        }
    }
}
