//! Declarative retry policy with exponential backoff and jitter.
//!
//! A [`RetrySpec`] is immutable and shared read-only by every call a
//! downstream client makes. The attempt counter lives on the stack of a
//! single [`RetrySpec::run`] call.
//!
//! ```rust
//! use movies_gateway::core::retry::RetrySpec;
//! use std::time::Duration;
//!
//! let spec = RetrySpec::builder()
//!     .max_attempts(4)
//!     .base_delay(Duration::from_millis(100))
//!     .jitter_factor(0.1)
//!     .build();
//! assert_eq!(spec.max_attempts, 4);
//! ```

use crate::utils::error::{ErrorKind, RemoteError};
use rand::Rng;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Jitter at or above this value could let a later delay undercut an
/// earlier one.
pub const MAX_JITTER_FACTOR: f64 = 0.33;

const MAX_EXPONENT: u32 = 30;

/// # Default Values
///
/// - `max_attempts`: 4 (the first call plus three retries)
/// - `base_delay`: 1 second
/// - `jitter_factor`: 0.1
/// - `retryable_kinds`: `{ServerError}`
#[derive(Debug, Clone, PartialEq)]
pub struct RetrySpec {
    /// Total attempts including the first.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Multiplicative jitter; the delay is scaled by a factor drawn from
    /// `[1 - jitter_factor, 1 + jitter_factor]`.
    pub jitter_factor: f64,
    pub retryable_kinds: HashSet<ErrorKind>,
}

impl Default for RetrySpec {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RetrySpec {
    pub fn builder() -> RetrySpecBuilder {
        RetrySpecBuilder {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            jitter_factor: 0.1,
            retryable_kinds: HashSet::from([ErrorKind::ServerError]),
        }
    }

    /// Exactly one attempt, no backoff.
    pub fn no_retry() -> Self {
        Self::builder().max_attempts(1).build()
    }

    /// `attempt` is the 1-based number of the attempt that just failed.
    pub fn should_retry(&self, attempt: u32, error: &RemoteError) -> bool {
        attempt < self.max_attempts && self.retryable_kinds.contains(&error.kind)
    }

    /// Un-jittered backoff: `base_delay * 2^(attempt - 1)`.
    pub fn nominal_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_EXPONENT);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Backoff to wait after `attempt` failed, with jitter applied.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let nominal = self.nominal_delay(attempt);
        let jitter = self.jitter_factor.clamp(0.0, MAX_JITTER_FACTOR);
        if jitter == 0.0 {
            return nominal;
        }
        let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
        // Saturated nominal delays stay saturated instead of overflowing.
        Duration::try_from_secs_f64(nominal.as_secs_f64() * factor).unwrap_or(nominal)
    }

    /// Drive `operation` until it succeeds, fails terminally, or the attempt
    /// budget runs out. The last classified error is returned unchanged.
    pub async fn run<F, Fut, T>(&self, target: &str, mut operation: F) -> Result<T, RemoteError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(target_url = target, attempt, "Call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if self.should_retry(attempt, &err) => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        target_url = target,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Call failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if self.retryable_kinds.contains(&err.kind) {
                        tracing::error!(
                            target_url = target,
                            attempt,
                            error = %err,
                            "Call failed after max attempts"
                        );
                    } else {
                        tracing::debug!(
                            target_url = target,
                            kind = ?err.kind,
                            "Error is not retryable"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrySpecBuilder {
    max_attempts: u32,
    base_delay: Duration,
    jitter_factor: f64,
    retryable_kinds: HashSet<ErrorKind>,
}

impl RetrySpecBuilder {
    /// Values below one are raised to one.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn jitter_factor(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor.clamp(0.0, MAX_JITTER_FACTOR);
        self
    }

    pub fn retryable_kinds(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.retryable_kinds = kinds.into_iter().collect();
        self
    }

    pub fn build(self) -> RetrySpec {
        RetrySpec {
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
            jitter_factor: self.jitter_factor,
            retryable_kinds: self.retryable_kinds,
        }
    }
}
