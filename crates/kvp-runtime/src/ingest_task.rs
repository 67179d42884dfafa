use std::hash::Hash;
use std::sync::Arc;

use chrono::Utc;
use kvp_core::{BatchWindow, CloseReason, ClosedBatch, Update};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::metrics::SupplierMetrics;
use crate::source::UpdateSource;
use crate::supplier::SupplierStatus;
use crate::view::SnapshotView;

// ---------------------------------------------------------------------------
// IngestTask — everything the background pipeline owns
// ---------------------------------------------------------------------------

pub(crate) struct IngestTask<K, V, S> {
    pub source: S,
    pub window: BatchWindow<Update<K, V>>,
    pub view: Arc<SnapshotView<K, V>>,
    pub metrics: Arc<SupplierMetrics>,
    pub epoch_tx: watch::Sender<u64>,
    pub status_tx: watch::Sender<SupplierStatus>,
    pub cancel: CancellationToken,
}

/// Consume `source` through the batch window until it ends, fails, or the
/// supplier is cancelled.
///
/// The loop waits on cancellation, the open window's deadline, and the next
/// update, in that priority order, so an expired window is closed before a
/// newer update can join it. The final status is published before returning.
#[tracing::instrument(name = "ingest", skip_all)]
pub(crate) async fn run_ingest<K, V, S>(task: IngestTask<K, V, S>)
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: UpdateSource<K, V>,
{
    let IngestTask {
        mut source,
        mut window,
        view,
        metrics,
        epoch_tx,
        status_tx,
        cancel,
    } = task;
    let mut publisher = Publisher {
        view,
        metrics: Arc::clone(&metrics),
        epoch_tx,
        epoch: 0,
    };

    let status = loop {
        let deadline = window.deadline().map(Instant::from_std);
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                let dropped = window.discard();
                metrics.add_discarded(dropped);
                kvp_debug!(pipe, dropped, "ingest cancelled");
                break SupplierStatus::Cancelled;
            }
            _ = sleep_until_deadline(deadline) => {
                if let Some(batch) = window.poll_expired(now()) {
                    publisher.apply(batch);
                }
            }
            next = source.next_update() => match next {
                Some(Ok(update)) => {
                    metrics.inc_received();
                    let at = now();
                    // The timer may not have been observed yet.
                    if let Some(batch) = window.poll_expired(at) {
                        publisher.apply(batch);
                    }
                    if let Some(batch) = window.push(update, at) {
                        publisher.apply(batch);
                    }
                }
                Some(Err(e)) => {
                    let dropped = window.discard();
                    metrics.add_discarded(dropped);
                    kvp_warn!(pipe, error = %e, dropped, epoch = publisher.epoch,
                        "update source failed, serving last published snapshot");
                    break SupplierStatus::Failed(e.to_string());
                }
                None => {
                    if let Some(batch) = window.drain(now()) {
                        publisher.apply(batch);
                    }
                    kvp_info!(pipe, epoch = publisher.epoch, "update source ended");
                    break SupplierStatus::Drained;
                }
            }
        }
    };

    status_tx.send_replace(status);
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

/// Sleep until the window deadline; pend forever while there is none.
async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

// ---------------------------------------------------------------------------
// Publisher — reduce, swap, announce
// ---------------------------------------------------------------------------

struct Publisher<K, V> {
    view: Arc<SnapshotView<K, V>>,
    metrics: Arc<SupplierMetrics>,
    epoch_tx: watch::Sender<u64>,
    epoch: u64,
}

impl<K, V> Publisher<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Fold the batch into a copy of the current snapshot and swap it in.
    fn apply(&mut self, batch: ClosedBatch<Update<K, V>>) {
        let reason = batch.reason;
        let updates = batch.len();
        let open_for = batch.open_for();

        let next = self.view.load().apply_batch(batch.events);
        let entries = next.len();
        self.view.publish(next);
        if reason == CloseReason::Latency {
            self.view.mark_interval_close(Utc::now());
        }

        self.metrics.record_batch(reason, updates);
        self.epoch += 1;
        self.epoch_tx.send_replace(self.epoch);
        kvp_debug!(pipe,
            epoch = self.epoch,
            reason = %reason,
            updates,
            entries,
            open_ms = open_for.as_millis() as u64,
            "batch applied"
        );
    }
}
