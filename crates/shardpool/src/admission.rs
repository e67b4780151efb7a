//! Admission strategies.
//!
//! An [`Admission`] decides which queue receives a job and what happens when
//! that queue is full. The pool hands each strategy an [`AdmitContext`] that
//! exposes the queue set, the shared round-robin counter and the pool's random
//! source, and nothing else. The three strategies provided here cover the
//! trade-offs between caller latency, delivery guarantee and load spread:
//!
//! | Strategy             | Placement                  | When full              |
//! |----------------------|----------------------------|------------------------|
//! | [`RoundRobinProbe`]  | round robin, random probes | [`Error::PoolBusy`]    |
//! | [`Blocking`]         | round robin                | caller blocks          |
//! | [`LeastLoaded`]      | shortest queue             | [`Error::PoolBusy`]    |
//!
//! Any `Fn(&AdmitContext<'_>, Job) -> Result<()>` is also an [`Admission`].

use crate::{
    Error, Job, RandSource, Result,
    pool::{PushError, QueueSet},
};
use core::sync::atomic::{AtomicUsize, Ordering};

/// A queue-selection policy.
pub trait Admission {
    /// Places `job` into one of the context's queues, or explains why it could
    /// not.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error::PoolBusy`] for backpressure and
    /// [`Error::Closed`] if the target queue is no longer served.
    fn admit(&self, ctx: &AdmitContext<'_>, job: Job) -> Result<()>;
}

impl<F> Admission for F
where
    F: Fn(&AdmitContext<'_>, Job) -> Result<()>,
{
    fn admit(&self, ctx: &AdmitContext<'_>, job: Job) -> Result<()> {
        self(ctx, job)
    }
}

/// The view of a pool an [`Admission`] works against.
pub struct AdmitContext<'a> {
    queues: &'a QueueSet,
    next_queue: &'a AtomicUsize,
    rand: &'a dyn RandSource,
}

impl<'a> AdmitContext<'a> {
    pub(crate) fn new(
        queues: &'a QueueSet,
        next_queue: &'a AtomicUsize,
        rand: &'a dyn RandSource,
    ) -> Self {
        Self {
            queues,
            next_queue,
            rand,
        }
    }

    /// Number of queues in the pool.
    pub fn queue_count(&self) -> usize {
        self.queues.count()
    }

    /// Capacity of each queue.
    pub fn queue_capacity(&self) -> usize {
        self.queues.capacity()
    }

    /// Advances the shared round-robin counter and returns the queue it lands
    /// on.
    ///
    /// Uses a relaxed atomic increment; the counter is the only state
    /// submitters share.
    pub fn next_index(&self) -> usize {
        self.next_queue.fetch_add(1, Ordering::Relaxed) % self.queues.count()
    }

    /// A uniformly random queue index.
    pub fn random_index(&self) -> usize {
        self.rand.rand_index(self.queues.count())
    }

    /// Jobs currently buffered in queue `index`.
    pub fn pending(&self, index: usize) -> usize {
        self.queues.pending(index)
    }

    /// Attempts to enqueue without blocking.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.queue_count()`.
    pub fn try_push(&self, index: usize, job: Job) -> core::result::Result<(), PushError> {
        self.queues.try_push(index, job)
    }

    /// Enqueues, blocking until queue `index` has room.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.queue_count()`.
    pub fn push(&self, index: usize, job: Job) -> core::result::Result<(), PushError> {
        self.queues.push(index, job)
    }
}

/// How many random probes [`RoundRobinProbe`] makes after its round-robin
/// target turns out to be full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeBudget {
    /// `ceil(queue_count / 2)` probes.
    #[default]
    Half,
    /// A fixed number of probes.
    Fixed(usize),
}

impl ProbeBudget {
    /// Number of probes for a pool of `queue_count` queues.
    pub fn probes(self, queue_count: usize) -> usize {
        match self {
            Self::Half => queue_count.div_ceil(2),
            Self::Fixed(n) => n,
        }
    }
}

/// Best-effort, non-blocking admission.
///
/// Tries the round-robin queue first. If it is full, probes up to
/// [`ProbeBudget::probes`] uniformly random queues (repeats allowed) and gives
/// up with [`Error::PoolBusy`] if none has room. The cost is bounded and the
/// caller never waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundRobinProbe {
    /// Probes made after the round-robin queue is found full.
    pub budget: ProbeBudget,
}

impl RoundRobinProbe {
    /// A round-robin strategy with the given probe budget.
    pub const fn new(budget: ProbeBudget) -> Self {
        Self { budget }
    }
}

impl Admission for RoundRobinProbe {
    fn admit(&self, ctx: &AdmitContext<'_>, job: Job) -> Result<()> {
        let mut job = match ctx.try_push(ctx.next_index(), job) {
            Ok(()) => return Ok(()),
            Err(e) => e.into_inner(),
        };

        for _ in 0..self.budget.probes(ctx.queue_count()) {
            job = match ctx.try_push(ctx.random_index(), job) {
                Ok(()) => return Ok(()),
                Err(e) => e.into_inner(),
            };
        }

        Err(Error::PoolBusy)
    }
}

/// Guaranteed admission.
///
/// Sends to the round-robin queue and, if it is full, blocks the caller until
/// that same queue has room. Never probes alternates and never reports
/// [`Error::PoolBusy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Blocking;

impl Admission for Blocking {
    fn admit(&self, ctx: &AdmitContext<'_>, job: Job) -> Result<()> {
        ctx.push(ctx.next_index(), job).map_err(|_| Error::Closed)
    }
}

/// Balanced, non-blocking admission.
///
/// Scans every queue's pending length and tries the shortest one, preferring
/// the lowest index on ties. Costs `O(queue_count)` per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeastLoaded;

impl LeastLoaded {
    /// Index of the shortest queue; the first one wins ties.
    pub fn pick(ctx: &AdmitContext<'_>) -> usize {
        (0..ctx.queue_count())
            .min_by_key(|&index| ctx.pending(index))
            .unwrap_or(0)
    }
}

impl Admission for LeastLoaded {
    fn admit(&self, ctx: &AdmitContext<'_>, job: Job) -> Result<()> {
        ctx.try_push(Self::pick(ctx), job).map_err(|_| Error::PoolBusy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRand(usize);

    impl RandSource for FixedRand {
        fn rand_index(&self, bound: usize) -> usize {
            self.0 % bound
        }
    }

    fn fill(queues: &QueueSet, index: usize, n: usize) {
        for _ in 0..n {
            queues.try_push(index, Job::new(|| {})).unwrap();
        }
    }

    #[test]
    fn probe_budget_rounds_up() {
        assert_eq!(ProbeBudget::Half.probes(1), 1);
        assert_eq!(ProbeBudget::Half.probes(4), 2);
        assert_eq!(ProbeBudget::Half.probes(5), 3);
        assert_eq!(ProbeBudget::Fixed(0).probes(5), 0);
    }

    #[test]
    fn round_robin_cycles_through_queues() {
        let (queues, _rx) = QueueSet::new(3, 4);
        let counter = AtomicUsize::new(0);
        let rand = FixedRand(0);
        let ctx = AdmitContext::new(&queues, &counter, &rand);

        for _ in 0..6 {
            RoundRobinProbe::default().admit(&ctx, Job::new(|| {})).unwrap();
        }
        assert_eq!(queues.pending_all(), vec![2, 2, 2]);
    }

    #[test]
    fn round_robin_falls_back_to_random_probe() {
        let (queues, _rx) = QueueSet::new(2, 1);
        fill(&queues, 0, 1);
        let counter = AtomicUsize::new(0);
        let rand = FixedRand(1);
        let ctx = AdmitContext::new(&queues, &counter, &rand);

        RoundRobinProbe::default().admit(&ctx, Job::new(|| {})).unwrap();
        assert_eq!(queues.pending_all(), vec![1, 1]);
    }

    #[test]
    fn round_robin_reports_busy_when_probes_miss() {
        let (queues, _rx) = QueueSet::new(2, 1);
        fill(&queues, 0, 1);
        let counter = AtomicUsize::new(0);
        // The only probe lands on the full queue again.
        let rand = FixedRand(0);
        let ctx = AdmitContext::new(&queues, &counter, &rand);

        let err = RoundRobinProbe::default()
            .admit(&ctx, Job::new(|| {}))
            .unwrap_err();
        assert!(err.is_busy());
        assert_eq!(queues.pending_all(), vec![1, 0]);
    }

    #[test]
    fn zero_probe_budget_only_tries_round_robin() {
        let (queues, _rx) = QueueSet::new(2, 1);
        fill(&queues, 0, 1);
        let counter = AtomicUsize::new(0);
        let rand = FixedRand(1);
        let ctx = AdmitContext::new(&queues, &counter, &rand);

        let strategy = RoundRobinProbe::new(ProbeBudget::Fixed(0));
        assert!(strategy.admit(&ctx, Job::new(|| {})).unwrap_err().is_busy());
    }

    #[test]
    fn least_loaded_picks_shortest_then_lowest_index() {
        let (queues, _rx) = QueueSet::new(3, 8);
        fill(&queues, 0, 3);
        fill(&queues, 2, 1);
        let counter = AtomicUsize::new(0);
        let rand = FixedRand(0);
        let ctx = AdmitContext::new(&queues, &counter, &rand);

        LeastLoaded.admit(&ctx, Job::new(|| {})).unwrap();
        assert_eq!(queues.pending_all(), vec![3, 1, 1]);

        LeastLoaded.admit(&ctx, Job::new(|| {})).unwrap();
        assert_eq!(queues.pending_all(), vec![3, 2, 1]);
        // Balanced placement leaves the round-robin counter alone.
        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn least_loaded_reports_busy_when_all_full() {
        let (queues, _rx) = QueueSet::new(2, 1);
        fill(&queues, 0, 1);
        fill(&queues, 1, 1);
        let counter = AtomicUsize::new(0);
        let rand = FixedRand(0);
        let ctx = AdmitContext::new(&queues, &counter, &rand);

        assert!(LeastLoaded.admit(&ctx, Job::new(|| {})).unwrap_err().is_busy());
    }

    #[test]
    fn blocking_reports_closed_on_unserved_queue() {
        let (queues, receivers) = QueueSet::new(1, 0);
        drop(receivers);
        let counter = AtomicUsize::new(0);
        let rand = FixedRand(0);
        let ctx = AdmitContext::new(&queues, &counter, &rand);

        assert!(matches!(
            Blocking.admit(&ctx, Job::new(|| {})),
            Err(Error::Closed)
        ));
    }
}
