use core::fmt;

/// A unit of work: a boxed, zero-argument, resultless closure.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// The item carried by a queue.
///
/// A job is either a single [`Task`] or a task paired with a callback. The
/// worker that dequeues a paired job runs the callback immediately after the
/// task returns, before it pulls anything else off its queue.
pub enum Job {
    /// A standalone task.
    Single(Task),
    /// A task followed by its callback on the same worker.
    WithCallback {
        /// Runs first.
        task: Task,
        /// Runs once `task` has returned without panicking.
        callback: Task,
    },
}

impl Job {
    /// Wraps a closure as a standalone job.
    pub fn new<F>(task: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::Single(Box::new(task))
    }

    /// Pairs a task with a callback.
    pub fn with_callback<F, C>(task: F, callback: C) -> Self
    where
        F: FnOnce() + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        Self::WithCallback {
            task: Box::new(task),
            callback: Box::new(callback),
        }
    }

    /// Returns `true` if this job carries a callback.
    pub const fn has_callback(&self) -> bool {
        matches!(self, Self::WithCallback { .. })
    }
}

impl From<Task> for Job {
    fn from(task: Task) -> Self {
        Self::Single(task)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(_) => f.write_str("Job::Single"),
            Self::WithCallback { .. } => f.write_str("Job::WithCallback"),
        }
    }
}
