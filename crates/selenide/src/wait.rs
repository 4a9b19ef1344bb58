//! Wait engine.
//!
//! Every `should` and every command runs through [`wait_until`]: the action
//! is attempted until it succeeds, fails fatally, or the deadline passes.
//! Retryable failures are swallowed and the last one becomes the reason of
//! the resulting [`SelenideError::Timeout`].
//!
//! Time comes from the tokio clock, so paused-clock tests run instantly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::condition::{Condition, Verdict};
use crate::config::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{SelenideError, SelenideResult};

// =============================================================================
// TIMEOUT POLICY
// =============================================================================

/// How long to keep retrying and how often
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
    /// Total time budget in milliseconds; zero means a single attempt
    pub timeout_ms: u64,
    /// Pause between attempts in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS)
    }
}

impl TimeoutPolicy {
    /// Create a policy
    #[must_use]
    pub const fn new(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            timeout_ms,
            poll_interval_ms,
        }
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set timeout, halving the poll interval when it no longer fits
    #[must_use]
    pub const fn fit_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        if timeout_ms > 0 && self.poll_interval_ms >= timeout_ms {
            self.poll_interval_ms = timeout_ms / 2;
        }
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// A waiting policy needs a non-zero poll interval shorter than the timeout
    pub fn validate(&self) -> SelenideResult<()> {
        if self.timeout_ms == 0 {
            return Ok(());
        }
        if self.poll_interval_ms == 0 {
            return Err(SelenideError::InvalidConfiguration {
                message: "poll interval must be positive".to_string(),
            });
        }
        if self.poll_interval_ms >= self.timeout_ms {
            return Err(SelenideError::InvalidConfiguration {
                message: format!(
                    "poll interval {}ms must be shorter than timeout {}ms",
                    self.poll_interval_ms, self.timeout_ms
                ),
            });
        }
        Ok(())
    }
}

// =============================================================================
// WAIT LOOP
// =============================================================================

/// Retry `action` until it succeeds, fails fatally, or the policy times out.
///
/// An invalid policy fails with [`SelenideError::InvalidConfiguration`]
/// before the first attempt. The first attempt happens immediately. Between attempts the task sleeps
/// `min(poll_interval, time left)`, so the loop never overshoots the
/// deadline by more than one attempt.
pub async fn wait_until<T, F, Fut>(
    description: &str,
    policy: &TimeoutPolicy,
    mut action: F,
) -> SelenideResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SelenideResult<T>>,
{
    policy.validate()?;
    let deadline = Instant::now() + policy.timeout();
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let reason = match action().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(%description, attempt, "wait succeeded");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() => e.to_string(),
            Err(e) => return Err(e),
        };
        tracing::trace!(%description, attempt, %reason, "attempt failed");

        let now = Instant::now();
        if now >= deadline {
            tracing::debug!(%description, attempt, timeout_ms = policy.timeout_ms, "wait timed out");
            return Err(SelenideError::Timeout {
                timeout_ms: policy.timeout_ms,
                description: description.to_string(),
                reason,
            });
        }
        tokio::time::sleep(policy.poll_interval().min(deadline - now)).await;
    }
}

/// Something a condition can be evaluated against
#[async_trait]
pub trait Subject: fmt::Display + Send + Sync {
    /// Predicate type of the conditions it accepts
    type Predicate: Send + Sync;

    /// Resolve the subject afresh and evaluate `condition` once
    async fn evaluate(&self, condition: &Condition<Self::Predicate>) -> SelenideResult<Verdict>;
}

/// Wait until `condition` holds for `subject`
pub async fn wait_for<S>(
    subject: &S,
    condition: &Condition<S::Predicate>,
    policy: &TimeoutPolicy,
) -> SelenideResult<()>
where
    S: Subject + ?Sized,
{
    let description = format!("{subject}.should({condition})");
    wait_until(&description, policy, move || async move {
        let verdict = subject.evaluate(condition).await?;
        if verdict.satisfied {
            Ok(())
        } else {
            Err(SelenideError::ConditionNotMet {
                reason: verdict.reason,
            })
        }
    })
    .await
}

/// Unconditional pause
pub async fn hard_wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn absent() -> SelenideError {
        SelenideError::NoSuchElement {
            message: "no such element".into(),
        }
    }

    mod policy_tests {
        use super::*;

        #[test]
        fn test_default_policy() {
            let policy = TimeoutPolicy::default();
            assert_eq!(policy.timeout(), Duration::from_millis(4000));
            assert_eq!(policy.poll_interval(), Duration::from_millis(100));
            assert!(policy.validate().is_ok());
        }

        #[test]
        fn test_builder() {
            let policy = TimeoutPolicy::default().with_timeout(500).with_poll_interval(25);
            assert_eq!(policy, TimeoutPolicy::new(500, 25));
        }

        #[test]
        fn test_zero_timeout_is_valid() {
            assert!(TimeoutPolicy::new(0, 0).validate().is_ok());
        }

        #[test]
        fn test_fit_timeout_shrinks_poll_interval() {
            let policy = TimeoutPolicy::default().fit_timeout(50);
            assert_eq!(policy, TimeoutPolicy::new(50, 25));
            assert!(policy.validate().is_ok());
            assert_eq!(TimeoutPolicy::default().fit_timeout(500), TimeoutPolicy::new(500, 100));
            assert_eq!(TimeoutPolicy::default().fit_timeout(0), TimeoutPolicy::new(0, 100));
        }

        #[test]
        fn test_invalid_policies() {
            assert!(TimeoutPolicy::new(100, 0).validate().is_err());
            assert!(TimeoutPolicy::new(100, 100).validate().is_err());
            assert!(TimeoutPolicy::new(100, 500).validate().is_err());
        }
    }

    mod wait_until_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_first_attempt_success_never_sleeps() {
            let start = Instant::now();
            let value = wait_until("op", &TimeoutPolicy::new(1000, 100), || async { Ok(7) })
                .await
                .unwrap();
            assert_eq!(value, 7);
            assert_eq!(start.elapsed(), Duration::ZERO);
        }

        #[tokio::test(start_paused = true)]
        async fn test_retries_until_success() {
            let attempts = AtomicU32::new(0);
            let start = Instant::now();
            let value = wait_until("op", &TimeoutPolicy::new(1000, 100), || async {
                if attempts.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(absent())
                } else {
                    Ok("done")
                }
            })
            .await
            .unwrap();
            assert_eq!(value, "done");
            assert_eq!(attempts.load(Ordering::SeqCst), 4);
            assert_eq!(start.elapsed(), Duration::from_millis(300));
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_message_and_bound() {
            let attempts = AtomicU32::new(0);
            let start = Instant::now();
            let err = wait_until::<(), _, _>(
                "browser.element(By(css selector, a)).click",
                &TimeoutPolicy::new(300, 100),
                || async {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(SelenideError::not_interactable("element not interactable"))
                },
            )
            .await
            .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Timed out after 300ms, while waiting for:\n\tbrowser.element(By(css selector, a)).click\nReason:\n\telement not interactable"
            );
            assert_eq!(start.elapsed(), Duration::from_millis(300));
            assert_eq!(attempts.load(Ordering::SeqCst), 4);
        }

        #[tokio::test(start_paused = true)]
        async fn test_last_sleep_clamped_to_deadline() {
            let start = Instant::now();
            let err = wait_until::<(), _, _>("op", &TimeoutPolicy::new(250, 100), || async {
                Err(absent())
            })
            .await
            .unwrap_err();
            assert!(matches!(err, SelenideError::Timeout { .. }));
            assert_eq!(start.elapsed(), Duration::from_millis(250));
        }

        #[tokio::test(start_paused = true)]
        async fn test_zero_timeout_single_attempt() {
            let attempts = AtomicU32::new(0);
            let err = wait_until::<(), _, _>("op", &TimeoutPolicy::new(0, 0), || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(absent())
            })
            .await
            .unwrap_err();
            assert_eq!(attempts.load(Ordering::SeqCst), 1);
            assert!(err.to_string().starts_with("Timed out after 0ms"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_invalid_policy_rejected_before_first_attempt() {
            let attempts = AtomicU32::new(0);
            for policy in [TimeoutPolicy::new(50, 0), TimeoutPolicy::new(50, 100)] {
                let err = wait_until::<(), _, _>("op", &policy, || async {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(absent())
                })
                .await
                .unwrap_err();
                assert!(matches!(err, SelenideError::InvalidConfiguration { .. }));
            }
            assert_eq!(attempts.load(Ordering::SeqCst), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_fatal_error_aborts_immediately() {
            let attempts = AtomicU32::new(0);
            let start = Instant::now();
            let err = wait_until::<(), _, _>("op", &TimeoutPolicy::new(1000, 100), || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(SelenideError::transport("connection refused"))
            })
            .await
            .unwrap_err();
            assert!(matches!(err, SelenideError::Transport { .. }));
            assert_eq!(attempts.load(Ordering::SeqCst), 1);
            assert_eq!(start.elapsed(), Duration::ZERO);
        }

        #[tokio::test(start_paused = true)]
        async fn test_reason_is_last_failure() {
            let attempts = AtomicU32::new(0);
            let err = wait_until::<(), _, _>("op", &TimeoutPolicy::new(200, 100), || async {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                Err(SelenideError::ConditionNotMet {
                    reason: format!("attempt {n}"),
                })
            })
            .await
            .unwrap_err();
            assert!(err.to_string().ends_with("\tattempt 2"));
        }
    }

    mod hard_wait_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_hard_wait_sleeps() {
            let start = Instant::now();
            hard_wait(150).await;
            assert_eq!(start.elapsed(), Duration::from_millis(150));
        }
    }
}
