mod jsonl;

pub use jsonl::JsonLinesSource;

use async_trait::async_trait;
use kvp_core::Update;
use tokio::sync::mpsc;

/// Push-style producer of updates, consumed one at a time in emission order.
///
/// `None` means the producer has ended; `Some(Err(_))` is a terminal
/// failure. Implementations must be cancel-safe: the ingest task drops a
/// pending `next_update` future whenever a window deadline fires first, and
/// no update may be lost when that happens.
#[async_trait]
pub trait UpdateSource<K, V>: Send {
    async fn next_update(&mut self) -> Option<anyhow::Result<Update<K, V>>>;
}

#[async_trait]
impl<K, V> UpdateSource<K, V> for mpsc::Receiver<Update<K, V>>
where
    K: Send + 'static,
    V: Send + 'static,
{
    async fn next_update(&mut self) -> Option<anyhow::Result<Update<K, V>>> {
        self.recv().await.map(Ok)
    }
}

#[async_trait]
impl<K, V> UpdateSource<K, V> for mpsc::UnboundedReceiver<Update<K, V>>
where
    K: Send + 'static,
    V: Send + 'static,
{
    async fn next_update(&mut self) -> Option<anyhow::Result<Update<K, V>>> {
        self.recv().await.map(Ok)
    }
}

/// A channel whose producer can report failures in-band.
#[async_trait]
impl<K, V> UpdateSource<K, V> for mpsc::Receiver<anyhow::Result<Update<K, V>>>
where
    K: Send + 'static,
    V: Send + 'static,
{
    async fn next_update(&mut self) -> Option<anyhow::Result<Update<K, V>>> {
        self.recv().await
    }
}
