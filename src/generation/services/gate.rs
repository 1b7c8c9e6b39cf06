//! Process-wide admission gate bounding concurrent job execution.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Reasons an [`AdmissionGate::acquire`] call gives up waiting.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AdmissionError {
    /// The cancellation token fired before a slot became free.
    #[error("admission cancelled before a slot was free")]
    Cancelled,
    /// The gate was closed.
    #[error("admission gate is closed")]
    Closed,
}

#[derive(Debug)]
struct GateCounters {
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// Counting gate admitting at most `capacity` jobs into execution.
///
/// Clones share the same slots. Waiters are woken as permits drop; no
/// ordering among waiters is promised.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: NonZeroUsize,
    counters: Arc<GateCounters>,
}

impl AdmissionGate {
    /// Creates a gate with `capacity` execution slots.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity.get())),
            capacity,
            counters: Arc::new(GateCounters {
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    /// Waits for a free slot.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::Cancelled`] when `cancel` fires first and
    /// [`AdmissionError::Closed`] when the gate has been closed.
    pub async fn acquire(
        &self,
        cancel: &CancellationToken,
    ) -> Result<AdmissionPermit, AdmissionError> {
        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AdmissionError::Cancelled),
            acquired = Arc::clone(&self.semaphore).acquire_owned() => {
                acquired.map_err(|_| AdmissionError::Closed)?
            }
        };

        let now_active = self
            .counters
            .active
            .fetch_add(1, Ordering::SeqCst)
            .saturating_add(1);
        self.counters.peak.fetch_max(now_active, Ordering::SeqCst);
        Ok(AdmissionPermit {
            _permit: permit,
            counters: Arc::clone(&self.counters),
        })
    }

    /// Closes the gate; pending and future acquisitions fail with
    /// [`AdmissionError::Closed`].
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Returns the configured number of slots.
    #[must_use]
    pub const fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Returns the number of permits currently held.
    #[must_use]
    pub fn active(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }

    /// Returns the highest number of permits ever held at once.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }
}

/// Execution slot held by one running job; dropping it frees the slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    counters: Arc<GateCounters>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
    }
}
