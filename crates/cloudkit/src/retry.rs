//! Bounded retry with exponential backoff for mutating remote calls.

use crate::config::SessionConfig;
use crate::error::{ApiError, ApiResult};
use log::warn;
use std::thread;
use std::time::Duration;

/// How often and how patiently a failed call is repeated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(5),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            backoff_factor,
            ..Self::default()
        }
    }

    /// `retry_count` retries after the first attempt
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.retry_count.saturating_add(1),
            Duration::from_secs(config.retry_delay_secs),
            2.0,
        )
    }

    /// A single attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the failed attempt `attempt` (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }
}

/// Run `operation`, repeating it while it fails with a retryable error.
///
/// Non-retryable errors are returned at once. After the last attempt the
/// last error is returned.
pub fn with_retry<T, F>(policy: &RetryPolicy, description: &str, mut operation: F) -> ApiResult<T>
where
    F: FnMut() -> ApiResult<T>,
{
    let mut last_error: Option<ApiError> = None;

    for attempt in 0..policy.max_attempts {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !e.is_retryable() {
                    return Err(e);
                }

                if attempt + 1 >= policy.max_attempts {
                    last_error = Some(e);
                    break;
                }

                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    "{description}: attempt {}/{} failed: {e}. Retrying in {delay:?}",
                    attempt + 1,
                    policy.max_attempts
                );
                thread::sleep(delay);

                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ApiError::Other(format!("{description}: retry exhausted"))))
}
