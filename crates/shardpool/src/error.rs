use thiserror::Error;

/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All possible errors that `shardpool` can produce.
///
/// Admission errors ([`Error::EmptyTask`], [`Error::PoolBusy`],
/// [`Error::Closed`]) are returned synchronously to the submitter and mean the
/// task never entered a queue. A task that panics *after* admission is never
/// reported here: the worker isolates the panic and records it in
/// [`PoolStats::panicked`](crate::PoolStats::panicked).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A dynamic submission carried no task.
    #[error("task shouldn't be empty")]
    EmptyTask,

    /// Every probed queue was full.
    ///
    /// This is ordinary backpressure under bursty load. Callers should retry
    /// later or drop the work.
    #[error("pool is busy")]
    PoolBusy,

    /// The pool has been closed and no longer admits tasks.
    #[error("pool is closed")]
    Closed,

    /// A worker thread could not be spawned while building the pool.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if the error is transient backpressure and the same
    /// submission may succeed later.
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::PoolBusy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(Error::EmptyTask.to_string(), "task shouldn't be empty");
        assert_eq!(Error::PoolBusy.to_string(), "pool is busy");
        assert_eq!(Error::Closed.to_string(), "pool is closed");
    }

    #[test]
    fn only_busy_is_transient() {
        assert!(Error::PoolBusy.is_busy());
        assert!(!Error::Closed.is_busy());
        assert!(!Error::EmptyTask.is_busy());
    }
}
