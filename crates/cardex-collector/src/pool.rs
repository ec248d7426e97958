//! Bounded worker pool.
//!
//! Every pass of the pipeline fans its work out through [`run_bounded`]:
//! at most `max_workers` tasks run at once and results are gathered on the
//! calling task as workers finish. A failed or panicked worker is logged
//! and counted; its siblings keep running.

use crate::error::{CollectError, Result};
use std::future::Future;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error};

/// Results of one pass.
#[derive(Debug)]
pub struct PoolOutcome<T> {
    /// Values of the workers that succeeded, in completion order
    pub results: Vec<T>,
    /// Workers that returned an error, panicked, or were cancelled
    pub failed: usize,
}

impl<T> Default for PoolOutcome<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            failed: 0,
        }
    }
}

impl<T> PoolOutcome<T> {
    fn record(&mut self, pass: &str, joined: std::result::Result<Result<T>, JoinError>) {
        let err = match joined {
            Ok(Ok(value)) => {
                self.results.push(value);
                return;
            }
            Ok(Err(e)) => e,
            Err(e) => CollectError::Worker(e.to_string()),
        };

        error!(pass, error = %err, kind = ?err.kind(), "Worker failed");
        self.failed += 1;
    }
}

/// Run `work` over every input with at most `max_workers` in flight.
pub async fn run_bounded<I, F, Fut, T>(
    pass: &'static str,
    inputs: I,
    max_workers: usize,
    work: F,
) -> PoolOutcome<T>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let max_workers = max_workers.max(1);
    let mut workers = JoinSet::new();
    let mut outcome = PoolOutcome::default();
    let mut spawned = 0usize;

    for input in inputs {
        workers.spawn(work(input));
        spawned += 1;

        // Respect concurrency limit
        while workers.len() >= max_workers {
            if let Some(joined) = workers.join_next().await {
                outcome.record(pass, joined);
            }
        }
    }

    // Collect remaining results
    while let Some(joined) = workers.join_next().await {
        outcome.record(pass, joined);
    }

    debug!(
        pass,
        spawned,
        succeeded = outcome.results.len(),
        failed = outcome.failed,
        "Pass complete"
    );

    outcome
}
