//! The generic worker-pool engine.
//!
//! [`WorkerPool`] owns a set of bounded queues, the worker threads bound to
//! them and the round-robin counter. It knows nothing about *where* a job
//! should go: every submission names an [`Admission`] strategy, and the facades
//! ([`ConnectionPool`](crate::ConnectionPool), [`TaskPool`](crate::TaskPool))
//! are thin wrappers that pick one.
//!
//! Worker `i` is bound to queue `i % queue_count` for its entire lifetime.
//! There is no work stealing.

mod queue;
mod worker;


pub use queue::PushError;
pub(crate) use queue::QueueSet;

use crate::{
    Admission, AdmitContext, Error, Job, PoolShape, PoolStats, RandSource, Result, ThreadRandom,
    stats::Counters,
};
use core::sync::atomic::AtomicUsize;
use parking_lot::{Mutex, RwLock};
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};
#[cfg(feature = "tracing")]
use tracing::instrument;

#[cfg(feature = "cache-padded")]
type Counter = crossbeam_utils::CachePadded<AtomicUsize>;
#[cfg(not(feature = "cache-padded"))]
type Counter = AtomicUsize;

#[cfg(feature = "cache-padded")]
fn new_counter() -> Counter {
    crossbeam_utils::CachePadded::new(AtomicUsize::new(0))
}

#[cfg(not(feature = "cache-padded"))]
const fn new_counter() -> Counter {
    AtomicUsize::new(0)
}

/// A fixed set of worker threads consuming from a fixed set of bounded queues.
///
/// The pool is created fully running; there is no separate start phase. It is
/// closed exactly once, either explicitly with [`Self::close`] or implicitly
/// on drop.
///
/// ## Features
///
/// - ✅ Thread-safe, share it behind an [`Arc`] or a reference
/// - ✅ Pluggable [`Admission`] per submission
/// - ✅ Task panics are isolated per job
/// - ✅ Graceful close drains every admitted job
///
/// # Example
/// ```
/// use shardpool::{Job, LeastLoaded, PoolShape, ThreadRandom, WorkerPool};
/// use std::sync::{
///     Arc,
///     atomic::{AtomicUsize, Ordering},
/// };
///
/// let pool = WorkerPool::new("doc", PoolShape::new(2, 2, 8), ThreadRandom).unwrap();
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// let h = Arc::clone(&hits);
/// pool.submit_with(&LeastLoaded, Job::new(move || {
///     h.fetch_add(1, Ordering::Relaxed);
/// }))
/// .unwrap();
///
/// pool.close().unwrap();
/// assert_eq!(hits.load(Ordering::Relaxed), 1);
/// ```
pub struct WorkerPool<R = ThreadRandom> {
    name: String,
    shape: PoolShape,
    queues: RwLock<Option<QueueSet>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    next_queue: Counter,
    counters: Arc<Counters>,
    rand: R,
}

impl<R> WorkerPool<R>
where
    R: RandSource,
{
    /// Allocates the queues and starts the workers.
    ///
    /// `shape` is normalized first (see [`PoolShape::normalized`]), so the
    /// numbers are never a reason to fail. Worker threads are named
    /// `"{name}-worker-{i}"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the OS refuses to start a worker thread. Any
    /// workers already started are shut down before returning.
    pub fn new(name: impl Into<String>, shape: PoolShape, rand: R) -> Result<Self> {
        let name = name.into();
        let shape = shape.normalized();
        let (queues, receivers) = QueueSet::new(shape.queues, shape.queue_capacity);
        let counters = Arc::new(Counters::default());

        let mut workers = Vec::with_capacity(shape.workers);
        for worker_id in 0..shape.workers {
            let queue_index = worker_id % shape.queues;
            let rx = receivers[queue_index].clone();
            let worker_counters = Arc::clone(&counters);
            let spawned = thread::Builder::new()
                .name(format!("{name}-worker-{worker_id}"))
                .spawn(move || worker::worker_loop(worker_id, queue_index, rx, worker_counters));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Failed to spawn worker {} of pool {}: {}", worker_id, name, e);
                    drop(queues);
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(Error::Spawn(e));
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Pool {} started: {} workers, {} queues of capacity {}",
            name,
            shape.workers,
            shape.queues,
            shape.queue_capacity
        );

        Ok(Self {
            name,
            shape,
            queues: RwLock::new(Some(queues)),
            workers: Mutex::new(workers),
            next_queue: new_counter(),
            counters,
            rand,
        })
    }

    /// Admits `job` using `strategy`.
    ///
    /// The strategy runs under the pool's shared lock, so a concurrent
    /// [`Self::close`] waits until this admission has either enqueued the job
    /// or failed. The lock is taken recursively: a queued `close` never stalls
    /// a new admission, so a task that submits follow-up work while its own
    /// queue is backed up still gets an answer and its worker keeps draining.
    ///
    /// # Errors
    ///
    /// - [`Error::Closed`] if the pool has been closed.
    /// - Whatever `strategy` returns, typically [`Error::PoolBusy`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all, fields(pool = %self.name)))]
    pub fn submit_with<A>(&self, strategy: &A, job: Job) -> Result<()>
    where
        A: Admission + ?Sized,
    {
        let guard = self.queues.read_recursive();
        let Some(queues) = guard.as_ref() else {
            self.counters.record_rejected();
            return Err(Error::Closed);
        };

        let ctx = AdmitContext::new(queues, &self.next_queue, &self.rand);
        match strategy.admit(&ctx, job) {
            Ok(()) => {
                self.counters.record_submitted();
                Ok(())
            }
            Err(e) => {
                self.counters.record_rejected();
                #[cfg(feature = "tracing")]
                tracing::warn!("Pool {} rejected a job: {}", self.name, e);
                Err(e)
            }
        }
    }
}

impl<R> WorkerPool<R> {
    /// Stops admission, waits for every admitted job to run, and joins the
    /// workers.
    ///
    /// Only the first call does anything. A worker closing its own pool from
    /// inside a task is tolerated: every other worker is joined and the
    /// calling worker exits once its queue is drained.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] if the pool was already closed.
    pub fn close(&self) -> Result<()> {
        let Some(queues) = self.queues.write().take() else {
            return Err(Error::Closed);
        };

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Closing pool {}: draining {} queued jobs",
            self.name,
            queues.pending_all().iter().sum::<usize>()
        );
        drop(queues);

        let handles = core::mem::take(&mut *self.workers.lock());
        let current = thread::current().id();
        for (_worker_id, handle) in handles.into_iter().enumerate() {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                #[cfg(feature = "tracing")]
                tracing::warn!("Worker {} of pool {} exited abnormally", _worker_id, self.name);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Pool {} closed", self.name);
        Ok(())
    }

    /// Returns `true` once [`Self::close`] has started.
    pub fn is_closed(&self) -> bool {
        self.queues.read_recursive().is_none()
    }

    /// Prefix of the worker thread names.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The normalized shape the pool is running with.
    pub const fn shape(&self) -> PoolShape {
        self.shape
    }

    /// Number of queues after normalization.
    pub const fn queue_count(&self) -> usize {
        self.shape.queues
    }

    /// Capacity of each queue.
    pub const fn queue_capacity(&self) -> usize {
        self.shape.queue_capacity
    }

    /// Jobs buffered in queue `index`, or `0` once the pool is closed.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.queue_count()`.
    pub fn queue_len(&self, index: usize) -> usize {
        assert!(index < self.shape.queues, "queue index out of range");
        self.queues
            .read_recursive()
            .as_ref()
            .map_or(0, |queues| queues.pending(index))
    }

    /// Jobs buffered in every queue, in queue order. Empty once closed.
    pub fn queue_lens(&self) -> Vec<usize> {
        self.queues
            .read_recursive()
            .as_ref()
            .map_or_else(Vec::new, QueueSet::pending_all)
    }

    /// A snapshot of the pool's counters.
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }
}

impl<R> Drop for WorkerPool<R> {
    fn drop(&mut self) {
        if !self.is_closed() {
            let _ = self.close();
        }
    }
}

impl<R> core::fmt::Debug for WorkerPool<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("closed", &self.is_closed())
            .field("stats", &self.stats())
            .finish()
    }
}
