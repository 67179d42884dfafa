pub mod batching;
pub mod logging;
pub mod prefetch;
pub mod types;
mod validate;

pub use batching::{BatchingConfig, SourceConfig};
pub use logging::{LogFormat, LoggingConfig};
pub use prefetch::PrefetchConfig;
pub use types::HumanDuration;
