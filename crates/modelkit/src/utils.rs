//! Common utilities used across the crate.
//!
//! Parallelism configuration for batch prediction.

use rayon::prelude::*;

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// Passed through prediction code. When `Parallel`, rows may be processed
/// with `rayon` parallel iterators; when `Sequential`, they must not be.
///
/// The actual thread pool is set up at the model API level via `n_threads`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if the rayon pool has multiple threads)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map over a slice, preserving order, in parallel when allowed.
    pub fn maybe_par_map<T, U, F>(self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        if self.is_parallel() {
            items.par_iter().map(f).collect()
        } else {
            items.iter().map(f).collect()
        }
    }
}

/// Run `f` inside a thread pool sized by `n_threads`.
///
/// - 0 uses the global rayon pool
/// - 1 runs sequentially on the calling thread
/// - >1 builds a dedicated pool with that many threads
///
/// If a dedicated pool cannot be built, `f` runs sequentially.
pub fn run_with_threads<T: Send>(n_threads: usize, f: impl FnOnce(Parallelism) -> T + Send) -> T {
    let parallelism = Parallelism::from_threads(n_threads);

    match parallelism {
        Parallelism::Sequential => f(Parallelism::Sequential),
        Parallelism::Parallel if n_threads == 0 => f(Parallelism::Parallel),
        Parallelism::Parallel => {
            match rayon::ThreadPoolBuilder::new().num_threads(n_threads).build() {
                Ok(pool) => pool.install(|| f(Parallelism::Parallel)),
                Err(err) => {
                    tracing::warn!(%err, n_threads, "failed to build thread pool, running sequentially");
                    f(Parallelism::Sequential)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallelism_from_threads() {
        assert!(!Parallelism::from_threads(1).is_parallel());
        assert!(Parallelism::from_threads(2).is_parallel());
        assert!(Parallelism::from_threads(8).is_parallel());
    }

    #[test]
    fn run_with_threads_sequential() {
        let result = run_with_threads(1, |p| {
            assert_eq!(p, Parallelism::Sequential);
            42
        });
        assert_eq!(result, 42);
    }

    #[test]
    fn run_with_threads_dedicated_pool() {
        let result = run_with_threads(2, |_| rayon::current_num_threads());
        assert_eq!(result, 2);
    }

    #[test]
    fn maybe_par_map_preserves_order() {
        let items: Vec<u32> = (0..1000).collect();
        let seq = Parallelism::Sequential.maybe_par_map(&items, |x| x * 2);
        let par = Parallelism::Parallel.maybe_par_map(&items, |x| x * 2);
        assert_eq!(seq, par);
        assert_eq!(seq[999], 1998);
    }
}
