use rand::{Rng, rng};

/// A source of random queue indices for the probe fallback of
/// [`RoundRobinProbe`](crate::RoundRobinProbe).
///
/// This abstraction allows you to plug in a real random source or a fixed one
/// in tests.
///
/// # Example
/// ```
/// use shardpool::RandSource;
///
/// struct FirstQueue;
/// impl RandSource for FirstQueue {
///     fn rand_index(&self, _bound: usize) -> usize {
///         0
///     }
/// }
///
/// assert_eq!(FirstQueue.rand_index(8), 0);
/// ```
pub trait RandSource {
    /// Returns a uniformly distributed index in `0..bound`. `bound` is never
    /// zero.
    fn rand_index(&self, bound: usize) -> usize;
}

/// A `RandSource` that uses the thread-local RNG (`rand::rng()`).
///
/// Each OS thread has its own RNG instance, so concurrent submitters never
/// contend on it. This type does **not** store the RNG itself; it is a
/// zero-sized handle that reaches the thread-local generator on each call, so
/// it is `Send + Sync` and may be shared by a pool.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn rand_index(&self, bound: usize) -> usize {
        rng().random_range(0..bound)
    }
}
