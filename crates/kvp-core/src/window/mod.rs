mod types;


pub use types::{CloseReason, ClosedBatch};

use std::mem;
use std::time::{Duration, Instant};

use kvp_config::BatchingConfig;
use orion_error::ErrorOweBase;

use crate::error::{CoreReason, CoreResult};

/// Accumulates events into batches closed by count or by age.
///
/// The window opens on its first event. It closes when the pending batch
/// reaches `max_batch_size` (inside [`push`](Self::push)) or when
/// `max_latency` has elapsed since it opened (via
/// [`poll_expired`](Self::poll_expired)). A window has a single owner, so
/// whichever trigger is observed first closes it and the other finds it
/// empty. An empty window never ages and never emits.
///
/// Time is passed in by the caller; the window never reads a clock.
pub struct BatchWindow<E> {
    max_batch_size: usize,
    max_latency: Duration,
    pending: Vec<E>,
    /// Set by the first event of the current window, cleared on close.
    opened_at: Option<Instant>,
}

impl<E> BatchWindow<E> {
    /// Build an empty window from validated batching settings.
    pub fn new(config: &BatchingConfig) -> CoreResult<Self> {
        config.validate().owe(CoreReason::InvalidWindow)?;
        Ok(Self {
            max_batch_size: config.max_batch_size,
            max_latency: config.max_latency.as_duration(),
            pending: Vec::new(),
            opened_at: None,
        })
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn max_latency(&self) -> Duration {
        self.max_latency
    }

    /// Number of events in the current window.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Instant at which the current window expires, `None` while empty.
    ///
    /// Also `None` when `max_latency` reaches past the clock's range; such a
    /// window only closes by size or drain.
    pub fn deadline(&self) -> Option<Instant> {
        self.opened_at?.checked_add(self.max_latency)
    }

    /// Append one event. Returns the closed batch when this event fills
    /// the window.
    pub fn push(&mut self, event: E, now: Instant) -> Option<ClosedBatch<E>> {
        if self.opened_at.is_none() {
            self.opened_at = Some(now);
            self.pending.reserve(self.max_batch_size.min(1024));
        }
        self.pending.push(event);
        if self.pending.len() >= self.max_batch_size {
            return self.close(CloseReason::Size, now);
        }
        None
    }

    /// Close the window if it holds events and its deadline is at or before
    /// `now`.
    pub fn poll_expired(&mut self, now: Instant) -> Option<ClosedBatch<E>> {
        match self.deadline() {
            Some(deadline) if deadline <= now => self.close(CloseReason::Latency, now),
            _ => None,
        }
    }

    /// Close whatever is pending, regardless of size or age.
    pub fn drain(&mut self, now: Instant) -> Option<ClosedBatch<E>> {
        self.close(CloseReason::Drain, now)
    }

    /// Drop the pending events without emitting them. Returns how many were
    /// dropped.
    pub fn discard(&mut self) -> usize {
        self.opened_at = None;
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    fn close(&mut self, reason: CloseReason, now: Instant) -> Option<ClosedBatch<E>> {
        let opened_at = self.opened_at.take()?;
        let events = mem::take(&mut self.pending);
        Some(ClosedBatch {
            events,
            reason,
            opened_at,
            closed_at: now,
        })
    }
}
