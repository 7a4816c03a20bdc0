use crate::error::{Result, TallyError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

const MAX_CONCURRENCY: usize = 64;
const MAX_DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencySnapshot {
    pub limit: usize,
    pub in_flight: usize,
    /// Highest `in_flight` observed since the gate was created
    pub peak: usize,
}

/// Worker count used when nothing is configured: one per core, capped.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_DEFAULT_CONCURRENCY)
}

/// Parse an externally supplied concurrency value.
///
/// Blank or unparsable input yields `None`; numbers are clamped into `1..=64`.
pub fn parse_concurrency(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<usize>()
        .ok()
        .map(|value| value.clamp(1, MAX_CONCURRENCY))
}

/// Bounds how many sources are read and parsed at the same time.
#[derive(Debug, Clone)]
pub(crate) struct ConcurrencyGate {
    limit: usize,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyGate {
    pub(crate) fn new(limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(TallyError::InvalidConcurrency(limit));
        }
        Ok(Self {
            limit,
            semaphore: Arc::new(Semaphore::new(limit)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub(crate) fn limit(&self) -> usize {
        self.limit
    }

    pub(crate) async fn acquire(&self) -> WorkerPermit {
        // The semaphore is owned by the gate and never closed.
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .unwrap_or_else(|_| unreachable!("concurrency semaphore closed"));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        WorkerPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    pub(crate) fn snapshot(&self) -> ConcurrencySnapshot {
        ConcurrencySnapshot {
            limit: self.limit,
            in_flight: self.in_flight.load(Ordering::SeqCst),
            peak: self.peak.load(Ordering::SeqCst),
        }
    }
}

pub(crate) struct WorkerPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for WorkerPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
