use crate::{Result, Task};

/// The object-safe surface shared by [`ConnectionPool`](crate::ConnectionPool)
/// and [`TaskPool`](crate::TaskPool).
///
/// Consumers that only need "run this somewhere, with backpressure" can hold a
/// `dyn Executor` and stay agnostic of the admission strategy behind it.
pub trait Executor: Send + Sync {
    /// Admits `task` without blocking.
    ///
    /// # Errors
    ///
    /// [`Error::PoolBusy`](crate::Error::PoolBusy) under backpressure,
    /// [`Error::Closed`](crate::Error::Closed) after shutdown.
    fn execute(&self, task: Task) -> Result<()>;

    /// Admits `task` and blocks until it has run.
    ///
    /// # Errors
    ///
    /// Same as [`Executor::execute`]; the caller only blocks if admission
    /// succeeded.
    fn execute_sync(&self, task: Task) -> Result<()>;

    /// Closes the underlying pool, draining admitted work.
    ///
    /// # Errors
    ///
    /// [`Error::Closed`](crate::Error::Closed) if already closed.
    fn shutdown(&self) -> Result<()>;

    fn is_shutdown(&self) -> bool;
}

/// Admits `task` through `admit` and waits for it to finish.
///
/// The latch is released when the wrapped task returns *or* unwinds: a panic
/// drops the sender, which wakes the waiter just the same.
pub(crate) fn run_and_wait<F, A>(task: F, admit: A) -> Result<()>
where
    F: FnOnce() + Send + 'static,
    A: FnOnce(Task) -> Result<()>,
{
    let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
    admit(Box::new(move || {
        task();
        let _ = done_tx.send(());
    }))?;

    let _ = done_rx.recv();
    Ok(())
}
