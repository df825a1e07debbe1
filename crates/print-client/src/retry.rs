//! Exponential-backoff retry for gateway operations.

use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::DispatchError;

// ── Retry helper ───────────────────────────────────────────────────────

/// Run `op`, retrying on retryable errors with exponential backoff.
///
/// `op` receives the 1-based attempt number. Non-retryable errors are
/// returned immediately. On exhausting all attempts the last retryable error
/// is wrapped in [`DispatchError::RetriesExhausted`]. Cancelling `cancel`
/// aborts both an in-flight attempt and a pending backoff sleep with
/// [`DispatchError::Cancelled`].
pub async fn retry_op<T, F, Fut>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, DispatchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, DispatchError>>,
{
    if config.max_attempts == 0 {
        return Err(DispatchError::InvalidConfig(
            "max_attempts must be >= 1".into(),
        ));
    }

    let mut last_error: Option<DispatchError> = None;

    for attempt in 0..config.max_attempts {
        if cancel.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DispatchError::Cancelled),
            r = op(attempt + 1) => r,
        };
        match result {
            Ok(val) => return Ok(val),
            Err(e) => {
                if !e.is_retryable() {
                    return Err(e);
                }

                // Don't sleep after the last attempt.
                if attempt + 1 < config.max_attempts {
                    let delay = compute_delay(config, attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = config.max_attempts,
                        ?delay,
                        error = %e,
                        "retryable failure, backing off"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(DispatchError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                } else {
                    debug!(attempt = attempt + 1, error = %e, "final attempt failed");
                }
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => Err(DispatchError::RetriesExhausted {
            attempts: config.max_attempts,
            last_error: Box::new(e),
        }),
        None => Err(DispatchError::InvalidConfig(
            "max_attempts must be >= 1".into(),
        )),
    }
}

/// Backoff before the retry that follows `attempt` (0-indexed):
/// `initial_delay` doubled per attempt and capped at `max_delay`. With jitter
/// the delay lands in the upper half of that value.
pub(crate) fn compute_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    let capped = config.initial_delay.saturating_mul(factor).min(config.max_delay);
    if !config.jitter {
        return capped;
    }
    let floor = capped / 2;
    let span = u64::try_from((capped - floor).as_nanos()).unwrap_or(u64::MAX);
    if span == 0 {
        return capped;
    }
    floor + Duration::from_nanos(clock_nanos() % span)
}

/// Sub-second part of the wall clock, used as a cheap jitter source.
fn clock_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0)
}

// ── Tests ──────────────────────────────────────────────────────────────
