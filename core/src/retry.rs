// uranai_core/src/retry.rs

//! Uniform retry decorator for pipeline stages.
//!
//! One policy for every stage: bounded attempts, exponential backoff, and
//! retries only for the error classes `UranaiError::is_retryable` admits.
//! Validation and not-found failures pass through on the first attempt.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::UranaiResult;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
  /// Total attempts including the first. 1 disables retries entirely.
  pub max_attempts: u32,
  /// Delay before the second attempt; doubles for each further attempt.
  pub base_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    RetryPolicy { max_attempts: 3, base_delay: Duration::from_millis(200) }
  }
}

impl RetryPolicy {
  /// A policy that never retries, for callers that manage retry themselves.
  pub fn none() -> Self {
    RetryPolicy { max_attempts: 1, base_delay: Duration::ZERO }
  }

  fn delay_for(&self, attempt: u32) -> Duration {
    // attempt is 1-based; the delay after attempt N is base * 2^(N-1).
    self.base_delay.saturating_mul(1u32 << (attempt - 1).min(16))
  }
}

/// Runs `op` under the policy, surfacing the final failure unchanged.
pub async fn run<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut op: F) -> UranaiResult<T>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = UranaiResult<T>>,
{
  let max_attempts = policy.max_attempts.max(1);
  let mut attempt = 1;
  loop {
    match op().await {
      Ok(value) => return Ok(value),
      Err(err) if err.is_retryable() && attempt < max_attempts => {
        let delay = policy.delay_for(attempt);
        warn!(
          operation,
          attempt,
          max_attempts,
          delay_ms = delay.as_millis() as u64,
          error = %err,
          "stage failed, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
      }
      Err(err) => return Err(err),
    }
  }
}
