//! Retry engine with per-error-class exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::{ClassifiedError, ErrorKind};

/// Attempt budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// Spread each delay randomly by +/- 50%.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Long-wait schedule used for rate-limit errors.
    pub fn rate_limit() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 5_000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..self
        }
    }

    /// Delay after the `attempt`-th failed attempt (1-based):
    /// `min(base * multiplier^(attempt-1), max)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = self.base_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = scaled.min(self.max_delay_ms as f64).max(0.0);

        let mut delay_ms = capped.round() as u64;
        if self.jitter {
            delay_ms = apply_jitter(delay_ms);
        }
        Duration::from_millis(delay_ms)
    }

    /// `min(retry_after, max)`, for errors that say how long to wait.
    pub fn retry_after_delay(&self, retry_after_seconds: u64) -> Duration {
        let requested_ms = retry_after_seconds.saturating_mul(1_000);
        Duration::from_millis(requested_ms.min(self.max_delay_ms))
    }
}

fn apply_jitter(delay_ms: u64) -> u64 {
    let spread = delay_ms / 2;
    let offset = fastrand::u64(0..=spread * 2);
    (delay_ms - spread).saturating_add(offset)
}

/// Drives re-attempts of a fallible upstream call.
///
/// The policy is picked from the error of the latest attempt: rate-limit
/// errors use the long-wait policy, every other retryable kind the default
/// one. `InvalidCredentials` and `DataNotAvailable` are returned at once.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryEngine {
    default_policy: RetryPolicy,
    rate_limit_policy: RetryPolicy,
}

impl Default for RetryEngine {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), RetryPolicy::rate_limit())
    }
}

impl RetryEngine {
    pub fn new(default_policy: RetryPolicy, rate_limit_policy: RetryPolicy) -> Self {
        Self {
            default_policy,
            rate_limit_policy,
        }
    }

    pub fn default_policy(&self) -> &RetryPolicy {
        &self.default_policy
    }

    pub fn rate_limit_policy(&self) -> &RetryPolicy {
        &self.rate_limit_policy
    }

    pub fn policy_for(&self, kind: ErrorKind) -> &RetryPolicy {
        match kind {
            ErrorKind::RateLimit => &self.rate_limit_policy,
            _ => &self.default_policy,
        }
    }

    /// Wait before the next attempt after `attempt` failed with `error`.
    pub fn delay_for(&self, error: &ClassifiedError, attempt: u32) -> Duration {
        let policy = self.policy_for(error.kind());
        match (error.kind(), error.retry_after_seconds()) {
            (ErrorKind::RateLimit, Some(seconds)) => policy.retry_after_delay(seconds),
            _ => policy.backoff_delay(attempt),
        }
    }

    /// Run `operation` until it succeeds, fails terminally or runs out of
    /// attempts. `operation` receives the 1-based attempt number.
    ///
    /// `max_attempts` overrides the attempt budget of whichever policy
    /// applies; delays are unaffected.
    pub async fn execute<T, F, Fut>(
        &self,
        mut operation: F,
        max_attempts: Option<u32>,
    ) -> Result<T, ClassifiedError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ClassifiedError>>,
    {
        let mut attempt = 1;
        loop {
            let error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.is_retryable() {
                debug!(attempt, kind = %error.kind(), "not retrying terminal error");
                return Err(error);
            }

            let budget = max_attempts
                .unwrap_or(self.policy_for(error.kind()).max_attempts)
                .max(1);
            if attempt >= budget {
                warn!(attempt, kind = %error.kind(), "retries exhausted");
                return Err(error);
            }

            let delay = self.delay_for(&error, attempt);
            warn!(
                attempt,
                kind = %error.kind(),
                delay_ms = delay.as_millis() as u64,
                error = %error.message(),
                "upstream call failed; retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
