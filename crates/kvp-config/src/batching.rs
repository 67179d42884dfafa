use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::HumanDuration;

pub const DEFAULT_MAX_BATCH_SIZE: usize = 1;
pub const DEFAULT_MAX_LATENCY: Duration = Duration::from_secs(1);
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4096;

// ---------------------------------------------------------------------------
// BatchingConfig — deserialized from [batching]
// ---------------------------------------------------------------------------

/// The two closing conditions of a batch window.
///
/// A window closes as soon as it holds `max_batch_size` updates, or once
/// `max_latency` has elapsed since its first update arrived, whichever
/// happens first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchingConfig {
    pub max_batch_size: usize,
    pub max_latency: HumanDuration,
}

impl BatchingConfig {
    pub fn new(max_batch_size: usize, max_latency: Duration) -> Self {
        Self {
            max_batch_size,
            max_latency: max_latency.into(),
        }
    }

    /// Reject non-positive closing conditions.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_batch_size == 0 {
            anyhow::bail!("batching.max_batch_size must be > 0");
        }
        if self.max_latency.is_zero() {
            anyhow::bail!("batching.max_latency must be > 0, got {}", self.max_latency);
        }
        Ok(())
    }
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_LATENCY)
    }
}

// ---------------------------------------------------------------------------
// SourceConfig — deserialized from [source]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Capacity of the bounded channel between a producer and the supplier.
    pub channel_capacity: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
