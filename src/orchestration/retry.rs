//! Retry of atomic operations that lost the SQLite write lock.

use backoff::future::retry;
use backoff::ExponentialBackoff;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::AppError;

fn policy() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(20),
        max_interval: Duration::from_millis(500),
        max_elapsed_time: Some(Duration::from_secs(5)),
        ..Default::default()
    }
}

/// Run `op` until it succeeds or fails with anything other than a busy
/// database. Every attempt must open its own transaction.
pub async fn retry_busy<T, F, Fut>(operation: &'static str, mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    retry(policy(), || {
        let attempt = op();
        async move {
            attempt.await.map_err(|e| {
                if e.is_busy() {
                    warn!(operation, error = %e, "database busy, retrying");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        }
    })
    .await
}
