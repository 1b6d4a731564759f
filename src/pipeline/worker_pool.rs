/*!
 * Bounded fan-out of independent work units.
 *
 * Units run concurrently up to `min(max_workers, units)`; each unit's
 * result is kept separately so one failure never cancels its siblings.
 */

use futures::stream::{self, StreamExt};
use log::debug;
use std::future::Future;

/// Fixed-ceiling pool for independent async units
#[derive(Debug, Clone, Copy)]
pub struct BoundedWorkerPool {
    /// Configured ceiling on concurrent units
    max_workers: usize,
}

impl BoundedWorkerPool {
    /// Create a pool with the given ceiling (at least one worker)
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    /// Configured ceiling
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Number of workers used for `unit_count` units
    pub fn pool_size(&self, unit_count: usize) -> usize {
        self.max_workers.min(unit_count).max(1)
    }

    /// Run `work` over every unit and return the outcomes in input order.
    ///
    /// A unit's error is returned in its slot; the other units still run.
    pub async fn run<U, T, E, F, Fut>(&self, units: Vec<U>, work: F) -> Vec<Result<T, E>>
    where
        F: Fn(U) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if units.is_empty() {
            return Vec::new();
        }

        let workers = self.pool_size(units.len());
        debug!("Running {} unit(s) on {} worker(s)", units.len(), workers);

        let mut results: Vec<(usize, Result<T, E>)> = stream::iter(units.into_iter().enumerate())
            .map(|(index, unit)| {
                let future = work(unit);
                async move { (index, future.await) }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        // Sort results by unit index to maintain original order
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }
}

impl Default for BoundedWorkerPool {
    fn default() -> Self {
        Self::new(15)
    }
}
