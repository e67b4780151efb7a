use core::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time snapshot of a pool's counters.
///
/// Counters are read individually with relaxed ordering, so a snapshot taken
/// while the pool is busy is approximate. Once
/// [`WorkerPool::close`](crate::WorkerPool::close) returns, `completed` equals
/// `submitted`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs admitted into a queue.
    pub submitted: u64,
    /// Jobs a worker has finished with, whether or not they panicked.
    pub completed: u64,
    /// Task or callback bodies that panicked.
    pub panicked: u64,
    /// Admissions the pool refused, as busy or closed.
    pub rejected: u64,
}

impl PoolStats {
    /// Jobs admitted but not yet finished.
    pub const fn in_flight(&self) -> u64 {
        self.submitted.saturating_sub(self.completed)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
    rejected: AtomicU64,
}

impl Counters {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_panicked(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PoolStats {
        PoolStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}
