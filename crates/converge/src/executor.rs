//! Concurrent convergence of independent resources
//!
//! Each job owns one wait for one resource. Jobs share nothing unless the
//! caller clones a [`CancelToken`](crate::CancelToken) into them.

use log::debug;
use rayon::prelude::*;

/// One independent wait, typically a closure around
/// [`StateChangeConf::wait_for_state`](crate::StateChangeConf::wait_for_state).
pub type WaitJob<'a, T> = Box<dyn FnOnce() -> T + Send + 'a>;

/// Run independent waits with at most `jobs` in flight.
///
/// Results come back in input order regardless of completion order.
pub fn wait_all<'a, T: Send>(
    jobs: usize,
    waits: Vec<WaitJob<'a, T>>,
) -> Result<Vec<T>, rayon::ThreadPoolBuildError> {
    if jobs <= 1 || waits.len() <= 1 {
        // Sequential execution
        return Ok(waits.into_iter().map(|wait| wait()).collect());
    }

    debug!("Converging {} resources with {} jobs", waits.len(), jobs);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.min(waits.len()))
        .build()?;

    Ok(pool.install(|| waits.into_par_iter().map(|wait| wait()).collect()))
}
