use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kvp_config::BatchingConfig;
use kvp_core::{BatchWindow, Snapshot};
use orion_error::op_context;
use orion_error::prelude::*;
use orion_error::ErrorOweBase;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{RuntimeReason, RuntimeResult};
use crate::ingest_task::{IngestTask, run_ingest};
use crate::metrics::{MetricsSnapshot, SupplierMetrics};
use crate::source::UpdateSource;
use crate::view::{SnapshotReader, SnapshotView};

// ---------------------------------------------------------------------------
// SupplierStatus
// ---------------------------------------------------------------------------

/// Liveness of the background ingest task.
///
/// Every state other than `Running` is terminal; the snapshot stays readable
/// in all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupplierStatus {
    Running,
    /// The source ended; its remaining updates were applied.
    Drained,
    /// The source reported an error; the open window was discarded.
    Failed(String),
    /// The supplier was shut down; the open window was discarded.
    Cancelled,
}

impl SupplierStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

// ---------------------------------------------------------------------------
// PrefetchingSupplier
// ---------------------------------------------------------------------------

/// An in-memory snapshot kept current by a stream of updates.
///
/// A background task batches incoming updates (closing a batch after
/// `max_batch_size` updates or `max_latency`, whichever comes first), folds
/// each batch into a copy of the current snapshot and swaps the result in.
/// [`get`](Self::get) never waits for that pipeline.
///
/// Dropping the supplier cancels the background task; outstanding
/// [`SnapshotReader`]s keep serving the last published snapshot.
pub struct PrefetchingSupplier<K, V> {
    view: Arc<SnapshotView<K, V>>,
    metrics: Arc<SupplierMetrics>,
    epoch_rx: watch::Receiver<u64>,
    status_rx: watch::Receiver<SupplierStatus>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<K, V> PrefetchingSupplier<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Publish `initial` and start consuming `source` on the current Tokio
    /// runtime.
    ///
    /// Fails when `config` has a zero batch size or latency, or when called
    /// outside a Tokio runtime.
    pub fn with_initial_value<S>(
        initial: Snapshot<K, V>,
        source: S,
        config: BatchingConfig,
    ) -> RuntimeResult<Self>
    where
        S: UpdateSource<K, V> + 'static,
    {
        let mut op = op_context!("supplier-start").with_auto_log();
        op.record("max_batch_size", config.max_batch_size.to_string().as_str());
        op.record("max_latency", config.max_latency.to_string().as_str());

        let window = BatchWindow::new(&config).err_conv()?;
        let runtime = tokio::runtime::Handle::try_current().owe(RuntimeReason::Spawn)?;

        let entries = initial.len();
        let view = Arc::new(SnapshotView::new(initial));
        let metrics = Arc::new(SupplierMetrics::default());
        let (epoch_tx, epoch_rx) = watch::channel(0u64);
        let (status_tx, status_rx) = watch::channel(SupplierStatus::Running);
        let cancel = CancellationToken::new();

        let task = runtime.spawn(run_ingest(IngestTask {
            source,
            window,
            view: Arc::clone(&view),
            metrics: Arc::clone(&metrics),
            epoch_tx,
            status_tx,
            cancel: cancel.child_token(),
        }));

        kvp_info!(sys,
            entries,
            max_batch_size = config.max_batch_size,
            max_latency = %config.max_latency,
            "prefetching supplier started"
        );
        op.mark_suc();
        Ok(Self {
            view,
            metrics,
            epoch_rx,
            status_rx,
            cancel,
            task: Some(task),
        })
    }

    /// [`with_initial_value`](Self::with_initial_value) with
    /// [`BatchingConfig::default`].
    pub fn with_defaults<S>(initial: Snapshot<K, V>, source: S) -> RuntimeResult<Self>
    where
        S: UpdateSource<K, V> + 'static,
    {
        Self::with_initial_value(initial, source, BatchingConfig::default())
    }
}

impl<K, V> PrefetchingSupplier<K, V> {
    /// The latest published snapshot. Never blocks.
    pub fn get(&self) -> Arc<Snapshot<K, V>> {
        self.view.load()
    }

    /// When a window last closed because `max_latency` elapsed; the Unix
    /// epoch until that first happens.
    ///
    /// Size-triggered closes do not move this clock, so a source busy enough
    /// to fill every window before its deadline leaves it at the epoch.
    pub fn last_successful_update(&self) -> DateTime<Utc> {
        self.view.last_interval_close()
    }

    /// A cloneable read handle for other threads or tasks.
    pub fn reader(&self) -> SnapshotReader<K, V> {
        SnapshotReader::new(Arc::clone(&self.view))
    }

    /// Watch the publication epoch, the number of batches applied so far.
    ///
    /// The returned receiver treats the current epoch as seen; `changed()`
    /// resolves on the next publication.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        let mut rx = self.epoch_rx.clone();
        drop(rx.borrow_and_update());
        rx
    }

    /// Number of batches published so far.
    pub fn epoch(&self) -> u64 {
        *self.epoch_rx.borrow()
    }

    pub fn status(&self) -> SupplierStatus {
        self.status_rx.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<SupplierStatus> {
        self.status_rx.clone()
    }

    /// Resolve once the ingest task has stopped, with its final status.
    pub async fn wait_stopped(&self) -> SupplierStatus {
        let mut rx = self.status_rx.clone();
        let status = match rx.wait_for(|status| !status.is_running()).await {
            Ok(status) => status.clone(),
            // Sender gone without a final status: the task panicked.
            Err(_) => SupplierStatus::Failed("ingest task exited unexpectedly".into()),
        };
        status
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Ask the ingest task to stop. Returns immediately.
    pub fn shutdown(&self) {
        kvp_debug!(sys, "supplier shutdown requested");
        self.cancel.cancel();
    }

    /// Stop consuming the source and wait for the ingest task to exit.
    ///
    /// The open window, if any, is discarded; the last published snapshot
    /// stays readable through existing readers.
    pub async fn close(mut self) -> RuntimeResult<()> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.await.map_err(|e| {
                kvp_error!(sys, error = %e, "ingest task did not exit cleanly");
                StructError::from(RuntimeReason::Shutdown)
                    .with_detail(format!("ingest task join error: {e}"))
            })?;
        }
        let metrics = self.metrics.snapshot();
        kvp_info!(res,
            received = metrics.updates_received,
            applied = metrics.updates_applied,
            discarded = metrics.updates_discarded,
            batches = metrics.batches_applied(),
            "ingest totals"
        );
        kvp_info!(sys, epoch = self.epoch(), "prefetching supplier closed");
        Ok(())
    }
}

impl<K, V> Drop for PrefetchingSupplier<K, V> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
