//! Retry-with-backoff combinator, independent of any particular endpoint.
//!
//! Whether an error is worth retrying is decided by the error type through
//! [`Retryable`]; for the market-data client that is the status
//! classification done in `massive_api::classify`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::parse_or;

/// Backoff schedule for transient failures.
///
/// The delay after failed attempt `n` (1-based) is
/// `base_delay * multiplier^(n-1) + jitter_step * n`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub jitter_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            multiplier: 1.5,
            jitter_step: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            max_attempts: parse_or(&lookup, "MASSIVE_RETRY_MAX", defaults.max_attempts).max(1),
            base_delay: Duration::from_millis(parse_or(
                &lookup,
                "MASSIVE_RETRY_BASE_MS",
                defaults.base_delay.as_millis() as u64,
            )),
            multiplier: parse_or(&lookup, "MASSIVE_RETRY_MULTIPLIER", defaults.multiplier)
                .max(1.0),
            jitter_step: Duration::from_millis(parse_or(
                &lookup,
                "MASSIVE_RETRY_JITTER_MS",
                defaults.jitter_step.as_millis() as u64,
            )),
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(30) as i32;
        let backoff = self.base_delay.as_secs_f64() * self.multiplier.powi(exp);
        Duration::from_secs_f64(backoff) + self.jitter_step * attempt
    }
}

/// Errors that know whether the failed operation may succeed on retry.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for massive_api::Error {
    fn is_retryable(&self) -> bool {
        matches!(self, massive_api::Error::Transient { .. })
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent. The last error is returned unchanged.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts || !err.is_retryable() {
                    return Err(err);
                }
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    "{} request failed (attempt {}/{}): {}, retrying in {:.2}s",
                    label,
                    attempt,
                    max_attempts,
                    err,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
