//! Centralized retry policy for unreliable downstream calls.
//!
//! A small bounded number of attempts with exponential backoff and jitter,
//! applied uniformly to every provider invocation. Only retryable errors
//! consume retry budget.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use switchboard_core::config::RetryConfig;

use crate::error::BackendError;

/// Retry schedule: bounded attempts, exponential backoff, uniform jitter.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap on the backoff delay.
    pub max_delay: Duration,
    /// Upper bound of the uniform jitter added to each delay.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Build a policy from configuration.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }

    /// A policy with no delays, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Backoff delay before retry number `attempt` (0-based), with jitter.
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        if self.jitter.is_zero() {
            return exp;
        }
        let jitter_ms = rand::rng().random_range(0..=self.jitter.as_millis() as u64);
        exp + Duration::from_millis(jitter_ms)
    }

    /// Run `operation` under this policy.
    ///
    /// Retries only errors whose [`BackendError::is_retryable`] is true; a
    /// non-retryable error aborts immediately. Returns the last error once
    /// the attempt budget is exhausted.
    pub async fn run<T, F, Fut>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        for attempt in 0..self.max_attempts {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            "Call succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt + 1 < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        retryable = e.is_retryable(),
                        error = %e,
                        "Call failed; giving up"
                    );
                    return Err(e);
                }
            }
        }
        // max_attempts >= 1, so the loop always returns.
        unreachable!("retry loop exited without a result")
    }
}

// =============================================================================
// Tests
// =============================================================================
