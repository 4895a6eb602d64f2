//! The core module
pub mod bounds;
pub mod estimators;

pub use self::bounds::Bounds;

use crate::error::{Error, Result};
use tracing::warn;

/// Integrand trait
pub trait Integrand<T: Copy>: Send + Sync {
    /// Evaluate the integrand at the point `x`, which has exactly `dim()` coordinates. Must not
    /// draw random numbers itself; failures are reported with [`Error::evaluation`].
    fn call(&self, x: &[T]) -> Result<T>;
    /// The dimension of the integrand.
    fn dim(&self) -> usize;
}

/// Derive the seed of the random number generator for worker `worker_id` from `base_seed`.
///
/// For a fixed `base_seed` this is a bijection on `u64`, so distinct workers never share a seed
/// and rerunning a worker reproduces its random numbers exactly.
pub const fn seed_for(base_seed: u64, worker_id: u64) -> u64 {
    base_seed.wrapping_add(worker_id)
}

/// Compute the number of calls every one of `ranks` participants performs when they share
/// `total_calls` in equal parts. Samples that cannot be distributed evenly are dropped.
pub(crate) fn calls_per_rank(ranks: usize, total_calls: usize) -> Result<usize> {
    if ranks == 0 {
        return Err(Error::configuration("the number of ranks must be positive"));
    }

    let calls = total_calls / ranks;

    if calls == 0 {
        return Err(Error::configuration(format!(
            "{} samples cannot be shared among {} ranks",
            total_calls, ranks
        )));
    }

    let remainder = total_calls - calls * ranks;

    if remainder != 0 {
        warn!(
            total_calls,
            ranks, remainder, "dropping samples that cannot be shared evenly"
        );
    }

    Ok(calls)
}
