//! Helpers shared by the pool tests.

use crate::{AdmitContext, Error, Job, Result};
use crossbeam_channel::{Receiver, Sender};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

/// Parks workers inside a task until released, so tests can observe queues
/// that are not being drained.
pub(crate) struct Gate {
    release_tx: Option<Sender<()>>,
    release_rx: Receiver<()>,
    entered: Arc<AtomicUsize>,
}

impl Gate {
    pub(crate) fn new() -> Self {
        let (release_tx, release_rx) = crossbeam_channel::bounded(0);
        Self {
            release_tx: Some(release_tx),
            release_rx,
            entered: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A task that blocks its worker until [`Gate::release`].
    pub(crate) fn task(&self) -> impl FnOnce() + Send + 'static {
        let rx = self.release_rx.clone();
        let entered = Arc::clone(&self.entered);
        move || {
            entered.fetch_add(1, Ordering::SeqCst);
            // Disconnection is the release signal.
            let _ = rx.recv();
        }
    }

    /// Spins until `n` gate tasks are running.
    pub(crate) fn wait_entered(&self, n: usize) {
        while self.entered.load(Ordering::SeqCst) < n {
            thread::yield_now();
        }
    }

    pub(crate) fn release(&mut self) {
        self.release_tx.take();
    }
}

/// An admission that always targets queue `index`.
pub(crate) fn pin_to(index: usize) -> impl Fn(&AdmitContext<'_>, Job) -> Result<()> {
    move |ctx: &AdmitContext<'_>, job: Job| ctx.try_push(index, job).map_err(|_| Error::PoolBusy)
}

/// Retries a non-blocking submission until it is admitted.
pub(crate) fn until_admitted(mut submit: impl FnMut() -> Result<()>) {
    loop {
        match submit() {
            Ok(()) => return,
            Err(e) if e.is_busy() => thread::yield_now(),
            Err(e) => panic!("unexpected admission error: {e}"),
        }
    }
}
