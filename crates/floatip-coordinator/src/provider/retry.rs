//! Bounded retry policies for provider requests
//!
//! Every provider call is attempted a fixed number of times. Each attempt is
//! classified into an [`AttemptOutcome`]; the policy then decides whether to
//! stop or sleep and try again. No sleep happens after the final attempt.

use floatip_common::defaults::{
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_SECS, DELETE_RETRY_BASE_SECS,
    DELETE_RETRY_STEP_SECS, PENDING_EVENT_RETRY_BASE_SECS, PENDING_EVENT_RETRY_STEP_SECS,
};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Classified result of a single HTTP attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 2xx response with its raw body
    Success { status: u16, body: String },
    /// 422 naming the reserved IP limit
    QuotaExceeded { message: String },
    /// 422 naming a pending event on the resource
    PendingEvent { message: String },
    /// 404
    NotFound { message: String },
    /// Any other 422
    UnprocessableEntity { message: String },
    /// Any other non-2xx status
    Failure { status: u16, message: String },
    /// Connection failure, per-attempt timeout or unreadable body
    Transport { message: String },
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Success { .. } => "success",
            AttemptOutcome::QuotaExceeded { .. } => "quota_exceeded",
            AttemptOutcome::PendingEvent { .. } => "pending_event",
            AttemptOutcome::NotFound { .. } => "not_found",
            AttemptOutcome::UnprocessableEntity { .. } => "unprocessable_entity",
            AttemptOutcome::Failure { .. } => "failure",
            AttemptOutcome::Transport { .. } => "transport",
        }
    }
}

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every attempt
    Flat(Duration),
    /// `base + step * attempt`, where `attempt` is zero-based
    Linear { base: Duration, step: Duration },
}

impl Backoff {
    /// Delay to sleep after the given zero-based attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Flat(d) => d,
            Backoff::Linear { base, step } => base + step * attempt,
        }
    }
}

/// What to do after an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Stop,
    RetryAfter(Duration),
}

/// Retry policy for a single class of operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    /// Delay after a generic failure
    pub backoff: Backoff,
    /// Delay after a pending-event rejection; `None` treats pending events as a plain 422
    pub pending_event_backoff: Option<Backoff>,
    /// Whether a 404 is a final answer rather than a generic failure
    pub not_found_is_final: bool,
}

impl RetryPolicy {
    /// List, create, assign and unassign: 3 attempts, 2s apart
    pub fn standard() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            backoff: Backoff::Flat(Duration::from_secs(DEFAULT_RETRY_DELAY_SECS)),
            pending_event_backoff: None,
            not_found_is_final: false,
        }
    }

    /// Delete: 3 attempts, `3 + k` seconds after failures, `5 + 2k` after pending events
    pub fn delete() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            backoff: Backoff::Linear {
                base: Duration::from_secs(DELETE_RETRY_BASE_SECS),
                step: Duration::from_secs(DELETE_RETRY_STEP_SECS),
            },
            pending_event_backoff: Some(Backoff::Linear {
                base: Duration::from_secs(PENDING_EVENT_RETRY_BASE_SECS),
                step: Duration::from_secs(PENDING_EVENT_RETRY_STEP_SECS),
            }),
            not_found_is_final: true,
        }
    }

    /// Same attempt count and classification, zero delays
    pub fn without_delays(mut self) -> Self {
        self.backoff = Backoff::Flat(Duration::ZERO);
        if self.pending_event_backoff.is_some() {
            self.pending_event_backoff = Some(Backoff::Flat(Duration::ZERO));
        }
        self
    }

    /// Reinterpret delete-only classifications for other operations.
    ///
    /// Outside delete, a pending event is a plain 422 and a 404 is a generic failure.
    pub fn normalize(&self, outcome: AttemptOutcome) -> AttemptOutcome {
        match outcome {
            AttemptOutcome::PendingEvent { message } if self.pending_event_backoff.is_none() => {
                AttemptOutcome::UnprocessableEntity { message }
            }
            AttemptOutcome::NotFound { message } if !self.not_found_is_final => {
                AttemptOutcome::Failure {
                    status: 404,
                    message,
                }
            }
            other => other,
        }
    }

    /// Decide what to do after the zero-based `attempt` produced `outcome`
    pub fn decide(&self, outcome: &AttemptOutcome, attempt: u32) -> Decision {
        let is_last = attempt + 1 >= self.attempts;

        let backoff = match outcome {
            AttemptOutcome::Success { .. }
            | AttemptOutcome::QuotaExceeded { .. }
            | AttemptOutcome::NotFound { .. }
            | AttemptOutcome::UnprocessableEntity { .. } => return Decision::Stop,
            AttemptOutcome::PendingEvent { .. } => match self.pending_event_backoff {
                Some(b) => b,
                None => return Decision::Stop,
            },
            AttemptOutcome::Failure { .. } | AttemptOutcome::Transport { .. } => self.backoff,
        };

        if is_last {
            Decision::Stop
        } else {
            Decision::RetryAfter(backoff.delay(attempt))
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Policies used by the provider client, per operation class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicies {
    pub standard: RetryPolicy,
    pub delete: RetryPolicy,
}

impl RetryPolicies {
    /// Zero-delay policies, for tests against a local mock server
    pub fn without_delays() -> Self {
        Self {
            standard: RetryPolicy::standard().without_delays(),
            delete: RetryPolicy::delete().without_delays(),
        }
    }
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            standard: RetryPolicy::standard(),
            delete: RetryPolicy::delete(),
        }
    }
}

/// Final outcome of a retried operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempted {
    pub outcome: AttemptOutcome,
    pub attempts: u32,
}

/// Run `attempt` until the policy says stop.
pub async fn run_with_policy<F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt: F,
) -> Attempted
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AttemptOutcome>,
{
    let mut n = 0u32;
    loop {
        let outcome = policy.normalize(attempt(n).await);
        match policy.decide(&outcome, n) {
            Decision::Stop => {
                return Attempted {
                    outcome,
                    attempts: n + 1,
                };
            }
            Decision::RetryAfter(delay) => {
                warn!(
                    operation,
                    attempt = n + 1,
                    max_attempts = policy.attempts,
                    outcome = outcome.label(),
                    delay_ms = delay.as_millis() as u64,
                    "Provider request failed, retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                n += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failure() -> AttemptOutcome {
        AttemptOutcome::Failure {
            status: 500,
            message: "boom".to_string(),
        }
    }

    fn pending() -> AttemptOutcome {
        AttemptOutcome::PendingEvent {
            message: "pending event".to_string(),
        }
    }

    #[test]
    fn standard_schedule() {
        let policy = RetryPolicy::standard();
        assert_eq!(
            policy.decide(&failure(), 0),
            Decision::RetryAfter(Duration::from_secs(2))
        );
        assert_eq!(
            policy.decide(&failure(), 1),
            Decision::RetryAfter(Duration::from_secs(2))
        );
        assert_eq!(policy.decide(&failure(), 2), Decision::Stop);
    }

    #[test]
    fn delete_schedule() {
        let policy = RetryPolicy::delete();
        assert_eq!(
            policy.decide(&failure(), 0),
            Decision::RetryAfter(Duration::from_secs(3))
        );
        assert_eq!(
            policy.decide(&failure(), 1),
            Decision::RetryAfter(Duration::from_secs(4))
        );
        assert_eq!(
            policy.decide(&pending(), 0),
            Decision::RetryAfter(Duration::from_secs(5))
        );
        assert_eq!(
            policy.decide(&pending(), 1),
            Decision::RetryAfter(Duration::from_secs(7))
        );
        assert_eq!(policy.decide(&pending(), 2), Decision::Stop);
    }

    #[test]
    fn terminal_outcomes_stop_immediately() {
        let policy = RetryPolicy::delete();
        for outcome in [
            AttemptOutcome::QuotaExceeded {
                message: String::new(),
            },
            AttemptOutcome::NotFound {
                message: String::new(),
            },
            AttemptOutcome::UnprocessableEntity {
                message: String::new(),
            },
        ] {
            assert_eq!(policy.decide(&outcome, 0), Decision::Stop);
        }
    }

    #[test]
    fn delete_only_classifications_are_normalized() {
        let standard = RetryPolicy::standard();
        assert!(matches!(
            standard.normalize(pending()),
            AttemptOutcome::UnprocessableEntity { .. }
        ));
        let not_found = AttemptOutcome::NotFound {
            message: "gone".to_string(),
        };
        assert_eq!(
            standard.normalize(not_found.clone()),
            AttemptOutcome::Failure {
                status: 404,
                message: "gone".to_string()
            }
        );
        assert_eq!(RetryPolicy::delete().normalize(not_found.clone()), not_found);
    }

    #[tokio::test(start_paused = true)]
    async fn driver_sleeps_between_attempts_only() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = tokio::time::Instant::now();

        let counter = calls.clone();
        let result = run_with_policy(&RetryPolicy::delete(), "delete", |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                failure()
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.attempts, 3);
        assert_eq!(result.outcome, failure());
        // 3s + 4s, nothing after the last attempt
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn driver_returns_first_success() {
        let result = run_with_policy(&RetryPolicy::standard(), "list", |attempt| async move {
            if attempt == 0 {
                AttemptOutcome::Transport {
                    message: "connection reset".to_string(),
                }
            } else {
                AttemptOutcome::Success {
                    status: 200,
                    body: "{}".to_string(),
                }
            }
        })
        .await;

        assert!(result.outcome.is_success());
        assert_eq!(result.attempts, 2);
    }
}
