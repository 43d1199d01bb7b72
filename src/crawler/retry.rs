//! Bounded retries for network operations

use crate::config::RetryConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Upper bound on a single backoff delay
const MAX_DELAY: Duration = Duration::from_secs(300);

/// Retries a fallible async operation a fixed number of times
///
/// The first retry waits `delay`; each later one multiplies the previous wait
/// by `backoff_multiplier` (1.0 keeps the delay fixed).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    backoff_multiplier: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff_multiplier: if backoff_multiplier >= 1.0 {
                backoff_multiplier
            } else {
                1.0
            },
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.delay_ms),
            config.backoff_multiplier,
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait before the retry that follows failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(64) as i32;
        let secs = self.delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        if secs.is_finite() && secs < MAX_DELAY.as_secs_f64() {
            Duration::from_secs_f64(secs)
        } else {
            MAX_DELAY
        }
    }

    /// Runs `operation` until it succeeds or the attempts are used up
    ///
    /// Every failure is logged against `target`; the last error is returned.
    pub async fn run<T, E, F, Fut>(&self, target: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt >= self.max_attempts => {
                    tracing::warn!(
                        "Giving up on {} after {} attempt(s): {}",
                        target,
                        attempt,
                        error
                    );
                    return Err(error);
                }
                Err(error) => {
                    let wait = self.delay_after(attempt);
                    tracing::debug!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        target,
                        error,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
