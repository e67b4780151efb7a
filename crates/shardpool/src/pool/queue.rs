//! The sharded set of bounded queues backing a pool.
//!
//! Each queue is a bounded `crossbeam-channel`. The pool keeps the senders;
//! workers hold clones of the receivers. Dropping the [`QueueSet`] disconnects
//! every queue, after which workers drain what is buffered and exit.

use crate::Job;
use crossbeam_channel::{Receiver, SendError, Sender, TrySendError, bounded};

/// Why a push could not enqueue a job. The job is handed back either way.
#[derive(Debug)]
pub enum PushError {
    /// The queue is at capacity (or, for a rendezvous queue, no worker is
    /// waiting).
    Full(Job),
    /// Nobody is receiving on the queue any more.
    Disconnected(Job),
}

impl PushError {
    /// Recovers the job that was not enqueued.
    pub fn into_inner(self) -> Job {
        match self {
            Self::Full(job) | Self::Disconnected(job) => job,
        }
    }
}

pub(crate) struct QueueSet {
    senders: Vec<Sender<Job>>,
    capacity: usize,
}

impl QueueSet {
    /// Allocates `count` queues of `capacity` and returns the receiving halves
    /// in queue order.
    pub(crate) fn new(count: usize, capacity: usize) -> (Self, Vec<Receiver<Job>>) {
        let (senders, receivers) = (0..count).map(|_| bounded(capacity)).unzip();
        (Self { senders, capacity }, receivers)
    }

    pub(crate) fn count(&self) -> usize {
        self.senders.len()
    }

    pub(crate) const fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn pending(&self, index: usize) -> usize {
        self.senders[index].len()
    }

    pub(crate) fn pending_all(&self) -> Vec<usize> {
        self.senders.iter().map(Sender::len).collect()
    }

    /// Pushes without blocking.
    pub(crate) fn try_push(&self, index: usize, job: Job) -> Result<(), PushError> {
        self.senders[index].try_send(job).map_err(|e| match e {
            TrySendError::Full(job) => PushError::Full(job),
            TrySendError::Disconnected(job) => PushError::Disconnected(job),
        })
    }

    /// Pushes, blocking the caller until the queue has room.
    pub(crate) fn push(&self, index: usize, job: Job) -> Result<(), PushError> {
        self.senders[index]
            .send(job)
            .map_err(|SendError(job)| PushError::Disconnected(job))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_push_respects_capacity() {
        let (queues, receivers) = QueueSet::new(2, 1);
        assert_eq!(queues.count(), 2);
        assert_eq!(queues.capacity(), 1);

        queues.try_push(0, Job::new(|| {})).unwrap();
        assert!(matches!(
            queues.try_push(0, Job::new(|| {})),
            Err(PushError::Full(_))
        ));
        queues.try_push(1, Job::new(|| {})).unwrap();
        assert_eq!(queues.pending_all(), vec![1, 1]);

        receivers[0].recv().unwrap();
        assert_eq!(queues.pending(0), 0);
    }

    #[test]
    fn rendezvous_queue_rejects_without_a_waiting_receiver() {
        let (queues, _receivers) = QueueSet::new(1, 0);
        assert!(matches!(
            queues.try_push(0, Job::new(|| {})),
            Err(PushError::Full(_))
        ));
    }

    #[test]
    fn push_reports_disconnection() {
        let (queues, receivers) = QueueSet::new(1, 4);
        drop(receivers);
        let err = queues.push(0, Job::new(|| {})).unwrap_err();
        assert!(matches!(err, PushError::Disconnected(_)));
        assert!(!err.into_inner().has_callback());
    }

    #[test]
    fn buffered_jobs_survive_sender_drop() {
        let (queues, receivers) = QueueSet::new(1, 4);
        queues.try_push(0, Job::new(|| {})).unwrap();
        queues.try_push(0, Job::new(|| {})).unwrap();
        drop(queues);

        assert_eq!(receivers[0].iter().count(), 2);
    }
}
