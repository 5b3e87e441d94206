//! Bounded polling with cancellation support.
//!
//! Provides a generic abstraction for waiting on provider state to converge:
//! check, and if not ready sleep a fixed interval, until the check succeeds,
//! the budget is spent or the cancellation token fires.

use backon::{BackoffBuilder, ConstantBuilder};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for fixed-interval polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between checks
    pub interval: Duration,
    /// Total time budget; the number of checks is `ceil(budget / interval)`
    pub budget: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, budget: Duration) -> Self {
        Self { interval, budget }
    }

    /// Number of checks this budget allows
    pub fn max_checks(&self) -> u32 {
        if self.interval.is_zero() {
            return 1;
        }
        let checks = self.budget.as_nanos().div_ceil(self.interval.as_nanos());
        u32::try_from(checks).unwrap_or(u32::MAX).max(1)
    }
}

/// Why polling stopped without a value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("Timed out after {waited:?} ({checks} checks)")]
    Timeout { waited: Duration, checks: u32 },

    #[error("Polling cancelled")]
    Cancelled,
}

/// Value produced by a successful poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polled<T> {
    pub value: T,
    /// Checks performed, including the successful one
    pub checks: u32,
}

/// Sleep for `delay`, returning `false` if `cancel` fired first.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = cancel.cancelled() => false,
    }
}

/// Poll `check` until it yields a value.
///
/// `check` returns `Ok(Some(value))` when ready and `Ok(None)` to keep waiting.
/// A check error is logged and treated as not ready.
pub async fn poll_until<T, E, F, Fut>(
    config: &PollConfig,
    cancel: &CancellationToken,
    mut check: F,
    resource_name: &str,
) -> Result<Polled<T>, PollError>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let max_checks = config.max_checks();
    let mut delays = ConstantBuilder::default()
        .with_delay(config.interval)
        .with_max_times(max_checks as usize)
        .build();

    let mut checks = 0u32;
    let mut waited = Duration::ZERO;

    while checks < max_checks {
        if cancel.is_cancelled() {
            return Err(PollError::Cancelled);
        }

        checks += 1;
        match check().await {
            Ok(Some(value)) => {
                debug!(resource = %resource_name, checks, "Resource converged");
                return Ok(Polled { value, checks });
            }
            Ok(None) => {
                debug!(resource = %resource_name, checks, max_checks, "Resource not ready");
            }
            Err(e) => {
                warn!(resource = %resource_name, checks, error = %e, "Resource check failed");
            }
        }

        let delay = delays.next().unwrap_or(config.interval);
        if !sleep_or_cancel(delay, cancel).await {
            return Err(PollError::Cancelled);
        }
        waited += delay;
    }

    Err(PollError::Timeout { waited, checks })
}
