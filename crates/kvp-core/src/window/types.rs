use std::fmt;
use std::time::{Duration, Instant};

/// Which trigger closed a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// The pending batch reached `max_batch_size`.
    Size,
    /// `max_latency` elapsed since the window's first event.
    Latency,
    /// The update source ended and the remainder was flushed.
    Drain,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Latency => "latency",
            Self::Drain => "drain",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A batch emitted by a [`BatchWindow`](super::BatchWindow), events in
/// arrival order.
#[derive(Debug)]
pub struct ClosedBatch<E> {
    pub events: Vec<E>,
    pub reason: CloseReason,
    pub opened_at: Instant,
    pub closed_at: Instant,
}

impl<E> ClosedBatch<E> {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// How long the window stayed open.
    pub fn open_for(&self) -> Duration {
        self.closed_at.saturating_duration_since(self.opened_at)
    }
}
