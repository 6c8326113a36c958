//! Fixed-delay retry executor.
//!
//! Two shapes of retry are used around collaborator calls:
//! - [`retry`]: repeat a failing call, aborting at once on a funding shortfall
//!   or a missing position
//! - [`poll_until`]: repeat a succeeding call until its result is ready,
//!   returning the last observation when it never is

use dlmm_lp_domain::LedgerError;
use dlmm_lp_domain::entities::PositionInfo;
use dlmm_lp_protocols::LiquidityProvider;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Bounded attempts with a fixed delay between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Wait between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Same attempts with a different delay.
    #[must_use]
    pub const fn with_delay(self, delay: Duration) -> Self {
        Self {
            attempts: self.attempts,
            delay,
        }
    }

    fn max_attempts(&self) -> u32 {
        self.attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(5))
    }
}

/// Runs `f` until it succeeds or the policy is exhausted.
///
/// A failure that is not [retryable](LedgerError::is_retryable) is returned
/// after the attempt that produced it. Otherwise the last failure is returned
/// once every attempt has failed.
pub async fn retry<T, F, Fut>(
    policy: RetryPolicy,
    operation: &str,
    mut f: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let attempts = policy.max_attempts();
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => {
                error!(operation, attempt, error = %e, "Aborting, error is not retryable");
                return Err(e);
            }
            Err(e) if attempt >= attempts => {
                warn!(operation, attempts, error = %e, "Retries exhausted");
                return Err(e);
            }
            Err(e) => {
                warn!(operation, attempt, attempts, error = %e, "Attempt failed, retrying");
                sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}

/// Polls `f` until `ready` accepts its result.
///
/// Never fails on a result that is merely not ready: after the last attempt
/// the most recent successful observation is returned. A failure is only
/// surfaced when no attempt succeeded, or at once when it is not retryable.
pub async fn poll_until<T, F, Fut, P>(
    policy: RetryPolicy,
    operation: &str,
    mut f: F,
    ready: P,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
    P: Fn(&T) -> bool,
{
    let attempts = policy.max_attempts();
    let mut last_seen: Option<T> = None;
    let mut last_error: Option<LedgerError> = None;

    for attempt in 1..=attempts {
        match f().await {
            Ok(value) if ready(&value) => return Ok(value),
            Ok(value) => {
                debug!(operation, attempt, attempts, "Result not ready yet");
                last_seen = Some(value);
            }
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                warn!(operation, attempt, attempts, error = %e, "Poll attempt failed");
                last_error = Some(e);
            }
        }
        if attempt < attempts {
            sleep(policy.delay).await;
        }
    }

    match (last_seen, last_error) {
        (Some(value), _) => Ok(value),
        (None, Some(e)) => Err(e),
        (None, None) => Err(LedgerError::Other(format!("{operation}: no attempt was made"))),
    }
}

/// Lists positions on `pool_address`, waiting for at least one to appear.
///
/// An empty list after the last attempt is a valid outcome.
pub async fn wait_for_positions(
    liquidity: &dyn LiquidityProvider,
    pool_address: &str,
    policy: RetryPolicy,
) -> Result<Vec<PositionInfo>, LedgerError> {
    poll_until(
        policy,
        "get positions",
        || liquidity.get_positions(pool_address),
        |positions: &Vec<PositionInfo>| !positions.is_empty(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn immediate(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_retry_returns_first_success() {
        let calls = &AtomicU32::new(0);
        let result = retry(immediate(5), "op", move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(LedgerError::Transient("timeout".into()))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausts_attempts_on_transient_error() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(immediate(4), "op", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::Transient("node is behind".into()))
        })
        .await;

        assert_eq!(result, Err(LedgerError::Transient("node is behind".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_retry_aborts_on_insufficient_funds() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(immediate(5), "swap", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::InsufficientFunds("0 lamports".into()))
        })
        .await;

        assert!(result.unwrap_err().is_insufficient_funds());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_aborts_on_missing_position() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry(immediate(5), "remove liquidity", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::NoPositionFound("pool".into()))
        })
        .await;

        assert!(result.unwrap_err().is_no_position());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_zero_attempts_still_tries_once() {
        let calls = &AtomicU32::new(0);
        let result = retry(immediate(0), "op", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, LedgerError>(())
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_poll_returns_last_observation_when_never_ready() {
        let calls = &AtomicU32::new(0);
        let result = poll_until(
            immediate(3),
            "positions",
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<Vec<u32>, LedgerError>(Vec::new())
            },
            |v| !v.is_empty(),
        )
        .await;

        assert_eq!(result.unwrap(), Vec::<u32>::new());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_stops_when_ready() {
        let calls = &AtomicU32::new(0);
        let result = poll_until(
            immediate(10),
            "positions",
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<Vec<u32>, LedgerError>(if n == 2 { vec![7] } else { Vec::new() })
            },
            |v| !v.is_empty(),
        )
        .await;

        assert_eq!(result.unwrap(), vec![7]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_poll_prefers_observation_over_later_error() {
        let calls = &AtomicU32::new(0);
        let result = poll_until(
            immediate(2),
            "positions",
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 1 {
                    Ok(Vec::<u32>::new())
                } else {
                    Err(LedgerError::Transient("timeout".into()))
                }
            },
            |v| !v.is_empty(),
        )
        .await;
        assert_eq!(result.unwrap(), Vec::<u32>::new());
    }

    #[tokio::test]
    async fn test_poll_surfaces_error_without_observation() {
        let result = poll_until(
            immediate(2),
            "positions",
            move || async move { Err::<Vec<u32>, _>(LedgerError::Other("rpc down".into())) },
            |v| !v.is_empty(),
        )
        .await;
        assert_eq!(result, Err(LedgerError::Other("rpc down".into())));
    }
}
