//! A pool for connection-handling work.
//!
//! [`ConnectionPool`] admits every task with [`RoundRobinProbe`]: round robin
//! first, a bounded number of random probes second, and an explicit
//! [`Error::PoolBusy`] when both miss. Callers get synchronous backpressure
//! instead of an unbounded backlog or a silent drop.

use crate::{
    ConnectionPoolConfig, Error, Executor, Job, PoolStats, RandSource, Result, RoundRobinProbe,
    Task, ThreadRandom, WorkerPool, executor::run_and_wait,
};

/// A worker pool with best-effort round-robin admission and submit-and-wait.
///
/// # Example
/// ```
/// use shardpool::{ConnectionPool, ConnectionPoolConfig};
/// use std::sync::{
///     Arc,
///     atomic::{AtomicUsize, Ordering},
/// };
///
/// let config = ConnectionPoolConfig::default()
///     .with_num_workers(4)
///     .with_num_queues(2)
///     .with_queue_size(16);
/// let pool = ConnectionPool::new(&config).unwrap();
///
/// let served = Arc::new(AtomicUsize::new(0));
/// let s = Arc::clone(&served);
/// pool.submit_sync(move || {
///     s.fetch_add(1, Ordering::SeqCst);
/// })
/// .unwrap();
/// assert_eq!(served.load(Ordering::SeqCst), 1);
///
/// pool.close().unwrap();
/// ```
#[derive(Debug)]
pub struct ConnectionPool<R = ThreadRandom> {
    pool: WorkerPool<R>,
    strategy: RoundRobinProbe,
}

impl ConnectionPool {
    /// Builds and starts a pool from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if a worker thread cannot be started.
    pub fn new(config: &ConnectionPoolConfig) -> Result<Self> {
        Self::with_rand(config, ThreadRandom)
    }
}

impl<R> ConnectionPool<R>
where
    R: RandSource,
{
    /// Like [`ConnectionPool::new`], drawing probe indices from `rand`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if a worker thread cannot be started.
    pub fn with_rand(config: &ConnectionPoolConfig, rand: R) -> Result<Self> {
        Ok(Self {
            pool: WorkerPool::new(config.name.clone(), config.shape(), rand)?,
            strategy: RoundRobinProbe::default(),
        })
    }

    /// Replaces the probe budget used by [`Self::submit`].
    #[must_use]
    pub fn with_strategy(mut self, strategy: RoundRobinProbe) -> Self {
        self.strategy = strategy;
        self
    }

    /// Submits `task` without blocking.
    ///
    /// # Errors
    ///
    /// - [`Error::PoolBusy`] if the round-robin queue and every probed queue
    ///   were full. Treat this as backpressure.
    /// - [`Error::Closed`] after [`Self::close`].
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.submit_with(&self.strategy, Job::new(task))
    }

    /// Submits a task that may be absent.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyTask`] if `task` is `None`; otherwise as [`Self::submit`].
    pub fn submit_boxed(&self, task: Option<Task>) -> Result<()> {
        let task = task.ok_or(Error::EmptyTask)?;
        self.pool.submit_with(&self.strategy, Job::Single(task))
    }

    /// Submits `task` and blocks until it has run.
    ///
    /// If admission fails the error is returned immediately and the caller
    /// never blocks. A task that panics still releases the caller, and the
    /// panic is not reported here.
    ///
    /// # Errors
    ///
    /// Same as [`Self::submit`].
    pub fn submit_sync<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        run_and_wait(task, |wrapped| {
            self.pool.submit_with(&self.strategy, Job::Single(wrapped))
        })
    }
}

impl<R> ConnectionPool<R> {
    /// Stops admission and waits for every admitted task to finish.
    ///
    /// # Errors
    ///
    /// [`Error::Closed`] if the pool was already closed.
    pub fn close(&self) -> Result<()> {
        self.pool.close()
    }

    /// Returns `true` once the pool has been closed.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// A snapshot of the pool's counters.
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// The engine underneath, for strategy-level access.
    pub const fn engine(&self) -> &WorkerPool<R> {
        &self.pool
    }
}

impl<R> Executor for ConnectionPool<R>
where
    R: RandSource + Send + Sync,
{
    fn execute(&self, task: Task) -> Result<()> {
        self.submit_boxed(Some(task))
    }

    fn execute_sync(&self, task: Task) -> Result<()> {
        self.submit_sync(task)
    }

    fn shutdown(&self) -> Result<()> {
        self.close()
    }

    fn is_shutdown(&self) -> bool {
        self.is_closed()
    }
}
