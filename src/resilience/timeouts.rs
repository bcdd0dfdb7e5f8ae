//! Deadline enforcement for probe checks.
//!
//! # Responsibilities
//! - Race a check against a wall-clock limit
//! - Cancel the check's token on expiry so spawned connection drivers stop
//! - Report run-level cancellation separately from timeouts

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// Why a deadline-bound operation did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeadlineError {
    #[error("timed out after {0:?}")]
    Elapsed(Duration),

    #[error("cancelled")]
    Cancelled,
}

/// Run `fut` until it completes, `limit` elapses, or `cancel` fires.
///
/// The future is dropped on expiry and `cancel` is cancelled, which tears
/// down anything else that was started under the same token.
pub async fn with_deadline<F>(
    limit: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, DeadlineError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DeadlineError::Cancelled),
        result = time::timeout(limit, fut) => match result {
            Ok(output) => Ok(output),
            Err(_) => {
                cancel.cancel();
                Err(DeadlineError::Elapsed(limit))
            }
        },
    }
}
