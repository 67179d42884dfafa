#[macro_use]
mod log_macros;

pub mod error;
mod ingest_task;
mod metrics;
pub mod source;
pub mod supplier;
pub mod tracing_init;
mod view;

pub use error::{RuntimeError, RuntimeReason, RuntimeResult};
pub use metrics::MetricsSnapshot;
pub use source::{JsonLinesSource, UpdateSource};
pub use supplier::{PrefetchingSupplier, SupplierStatus};
pub use view::{SnapshotReader, start_of_time};

pub use kvp_config::BatchingConfig;
pub use kvp_core::{Snapshot, Update};
