//! Segment extraction and archiving engine
//!
//! Both stages fan their per-segment work out over a bounded pool of tasks
//! and hand results back in input order.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::domain::errors::DomainError;

pub mod archiver;
pub mod extractor;

pub use archiver::SecureArchiver;
pub use extractor::SegmentExtractor;

/// Run `task` over `inputs` with at most `jobs` in flight.
///
/// The first error closes the pool so queued inputs never start, then waits
/// for the tasks already running. Nothing spawned here outlives the call.
/// With one job the inputs are processed strictly in order and nothing after
/// a failure is started.
pub(crate) async fn run_bounded<I, T, F, Fut>(
    jobs: usize,
    inputs: Vec<I>,
    task: F,
    task_failure: fn(String) -> DomainError,
) -> Result<Vec<T>, DomainError>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, DomainError>> + Send + 'static,
{
    if jobs <= 1 {
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            results.push(task(input).await?);
        }
        return Ok(results);
    }

    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut set = JoinSet::new();
    for (position, input) in inputs.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let work = task(input);
        set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| task_failure(format!("Worker pool closed: {}", e)))?;
            work.await.map(|value| (position, value))
        });
    }

    let mut results = Vec::with_capacity(set.len());
    let mut failure = None;
    while let Some(joined) = set.join_next().await {
        let outcome = joined.unwrap_or_else(|e| Err(task_failure(format!("Worker task failed: {}", e))));
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                if failure.is_none() {
                    semaphore.close();
                    failure = Some(e);
                }
            }
        }
    }
    if let Some(e) = failure {
        return Err(e);
    }

    results.sort_by_key(|(position, _)| *position);
    Ok(results.into_iter().map(|(_, value)| value).collect())
}
