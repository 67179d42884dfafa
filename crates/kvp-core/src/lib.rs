pub mod error;
pub mod snapshot;
pub mod update;
pub mod window;

pub use snapshot::Snapshot;
pub use update::Update;
pub use window::{BatchWindow, CloseReason, ClosedBatch};
