//! A general-purpose task pool with three admission policies.
//!
//! | Operation                         | Favors              | Caller blocks |
//! |-----------------------------------|---------------------|---------------|
//! | [`TaskPool::add_task`]            | caller latency      | never         |
//! | [`TaskPool::add_task_always`]     | delivery guarantee  | when full     |
//! | [`TaskPool::add_task_balance`]    | even queue depth    | never         |
//! | [`TaskPool::add_callback_task`]   | caller latency      | never         |

use crate::{
    Blocking, Error, Executor, Job, LeastLoaded, PoolStats, RandSource, Result, RoundRobinProbe,
    Task, TaskPoolOptions, ThreadRandom, WorkerPool, executor::run_and_wait,
};

/// A worker pool exposing round-robin, blocking and least-loaded admission.
///
/// # Example
/// ```
/// use shardpool::{TaskPool, TaskPoolOptions};
/// use std::sync::mpsc;
///
/// let pool = TaskPool::new(&TaskPoolOptions::default().pool_size(2).queue_length(8)).unwrap();
/// let (tx, rx) = mpsc::channel();
///
/// let done = tx.clone();
/// pool.add_callback_task(
///     move || tx.send("task").unwrap(),
///     move || done.send("callback").unwrap(),
/// )
/// .unwrap();
///
/// pool.close().unwrap();
/// assert_eq!(rx.iter().collect::<Vec<_>>(), vec!["task", "callback"]);
/// ```
#[derive(Debug)]
pub struct TaskPool<R = ThreadRandom> {
    pool: WorkerPool<R>,
    probe: RoundRobinProbe,
}

impl TaskPool {
    /// Builds and starts a pool from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if a worker thread cannot be started.
    pub fn new(options: &TaskPoolOptions) -> Result<Self> {
        Self::with_rand(options, ThreadRandom)
    }
}

impl<R> TaskPool<R>
where
    R: RandSource,
{
    /// Like [`TaskPool::new`], drawing probe indices from `rand`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if a worker thread cannot be started.
    pub fn with_rand(options: &TaskPoolOptions, rand: R) -> Result<Self> {
        Ok(Self {
            pool: WorkerPool::new(options.name.clone(), options.shape(), rand)?,
            probe: RoundRobinProbe::default(),
        })
    }

    /// Adds `task` without blocking: round robin, then bounded random probes.
    ///
    /// # Errors
    ///
    /// [`Error::PoolBusy`] if every probed queue was full; the task is dropped.
    /// [`Error::Closed`] after [`Self::close`].
    pub fn add_task<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.submit_with(&self.probe, Job::new(task))
    }

    /// [`Self::add_task`] for a task that may be absent.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyTask`] if `task` is `None`; otherwise as
    /// [`Self::add_task`].
    pub fn add_task_boxed(&self, task: Option<Task>) -> Result<()> {
        let task = task.ok_or(Error::EmptyTask)?;
        self.pool.submit_with(&self.probe, Job::Single(task))
    }

    /// Adds `task`, blocking until its round-robin queue has room.
    ///
    /// Use this when losing a task is not acceptable.
    ///
    /// # Errors
    ///
    /// Only [`Error::Closed`], if the pool was closed before admission.
    pub fn add_task_always<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.submit_with(&Blocking, Job::new(task))
    }

    /// Adds `task` to the least-loaded queue without blocking.
    ///
    /// # Errors
    ///
    /// [`Error::PoolBusy`] if even the shortest queue is full.
    /// [`Error::Closed`] after [`Self::close`].
    pub fn add_task_balance<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.submit_with(&LeastLoaded, Job::new(task))
    }

    /// Adds a task and a callback that runs right after it on the same worker.
    ///
    /// Placement follows [`Self::add_task`]. The callback is skipped if the
    /// task panics.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_task`].
    pub fn add_callback_task<F, C>(&self, task: F, callback: C) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        self.pool.submit_with(&self.probe, Job::with_callback(task, callback))
    }
}

impl<R> TaskPool<R> {
    /// Stops admission and waits for every queued task and callback to finish.
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

    /// Jobs buffered in every queue, in queue order.
    pub fn queue_lens(&self) -> Vec<usize> {
        self.pool.queue_lens()
    }

    /// The engine underneath, for strategy-level access.
    pub const fn engine(&self) -> &WorkerPool<R> {
        &self.pool
    }
}

impl<R> Executor for TaskPool<R>
where
    R: RandSource + Send + Sync,
{
    fn execute(&self, task: Task) -> Result<()> {
        self.add_task_boxed(Some(task))
    }

    fn execute_sync(&self, task: Task) -> Result<()> {
        run_and_wait(task, |wrapped| self.add_task_boxed(Some(wrapped)))
    }

    fn shutdown(&self) -> Result<()> {
        self.close()
    }

    fn is_shutdown(&self) -> bool {
        self.is_closed()
    }
}
