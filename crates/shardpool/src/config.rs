//! Pool configuration.
//!
//! Both facades describe their layout as a [`PoolShape`]: a worker count, a
//! queue count and a per-queue capacity. Out-of-range values are clamped by
//! [`PoolShape::normalized`] rather than rejected, so building a pool never
//! fails because of its numbers.

/// Thread-name prefix used when the caller does not supply one.
pub const DEFAULT_POOL_NAME: &str = "shardpool";

/// The layout of a [`WorkerPool`](crate::WorkerPool).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolShape {
    /// Number of worker threads.
    pub workers: usize,
    /// Number of independent queues.
    pub queues: usize,
    /// Capacity of every queue. `0` makes each queue a rendezvous handoff.
    pub queue_capacity: usize,
}

impl PoolShape {
    /// A shape as given; see [`Self::normalized`] for the clamped form.
    pub const fn new(workers: usize, queues: usize, queue_capacity: usize) -> Self {
        Self {
            workers,
            queues,
            queue_capacity,
        }
    }

    /// Clamps the shape to values a pool can run with.
    ///
    /// - `workers` and `queues` are raised to at least 1.
    /// - `queues` is lowered to at most `workers`. Worker `i` serves queue
    ///   `i % queues`, so this keeps every queue served and guarantees that
    ///   anything admitted into a queue is eventually executed.
    pub fn normalized(self) -> Self {
        let workers = self.workers.max(1);
        let queues = self.queues.clamp(1, workers);
        Self {
            workers,
            queues,
            queue_capacity: self.queue_capacity,
        }
    }
}

impl Default for PoolShape {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

/// Configuration for a [`ConnectionPool`](crate::ConnectionPool).
///
/// # Example
/// ```
/// use shardpool::ConnectionPoolConfig;
///
/// let config = ConnectionPoolConfig::default()
///     .with_num_workers(8)
///     .with_num_queues(4)
///     .with_queue_size(16);
/// assert_eq!(config.num_queues, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConnectionPoolConfig {
    /// Number of worker threads.
    pub num_workers: usize,
    /// Number of queues.
    pub num_queues: usize,
    /// Capacity of each queue.
    pub queue_size: usize,
    /// Prefix for worker thread names.
    pub name: String,
}

impl ConnectionPoolConfig {
    /// Sets the worker count.
    #[must_use]
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Sets the queue count.
    #[must_use]
    pub fn with_num_queues(mut self, num_queues: usize) -> Self {
        self.num_queues = num_queues;
        self
    }

    /// Sets the per-queue capacity.
    #[must_use]
    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }

    /// Sets the thread-name prefix.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The normalized pool layout this config describes.
    pub fn shape(&self) -> PoolShape {
        PoolShape::new(self.num_workers, self.num_queues, self.queue_size).normalized()
    }
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            num_workers: 1,
            num_queues: 1,
            queue_size: 0,
            name: DEFAULT_POOL_NAME.to_owned(),
        }
    }
}

/// Options for a [`TaskPool`](crate::TaskPool).
///
/// Unset options keep their defaults: one worker per CPU, a single queue and
/// a queue length of zero (synchronous handoff).
///
/// # Example
/// ```
/// use shardpool::TaskPoolOptions;
///
/// let options = TaskPoolOptions::default()
///     .pool_size(10)
///     .queue_number(2)
///     .queue_length(32);
/// assert_eq!(options.shape().workers, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TaskPoolOptions {
    /// Number of worker threads.
    pub pool_size: usize,
    /// Number of queues.
    pub queue_number: usize,
    /// Capacity of each queue.
    pub queue_length: usize,
    /// Prefix for worker thread names.
    pub name: String,
}

impl TaskPoolOptions {
    /// Sets the worker count.
    #[must_use]
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Sets the queue count.
    #[must_use]
    pub fn queue_number(mut self, number: usize) -> Self {
        self.queue_number = number;
        self
    }

    /// Sets the per-queue capacity.
    #[must_use]
    pub fn queue_length(mut self, length: usize) -> Self {
        self.queue_length = length;
        self
    }

    /// Sets the thread-name prefix.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The normalized pool layout these options describe.
    pub fn shape(&self) -> PoolShape {
        PoolShape::new(self.pool_size, self.queue_number, self.queue_length).normalized()
    }
}

impl Default for TaskPoolOptions {
    fn default() -> Self {
        Self {
            pool_size: num_cpus::get().max(1),
            queue_number: 1,
            queue_length: 0,
            name: DEFAULT_POOL_NAME.to_owned(),
        }
    }
}
