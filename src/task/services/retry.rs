//! Bounded retry with a fixed delay between attempts.

use std::fmt::Display;
use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{error, warn};

/// Retry policy: at most `max_attempts` tries, `delay` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: NonZeroU32,
    delay: Duration,
}

impl RetryPolicy {
    /// Default number of attempts.
    pub const DEFAULT_ATTEMPTS: NonZeroU32 = NonZeroU32::MIN.saturating_add(2);

    /// Default delay between attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

    /// Creates a retry policy.
    #[must_use]
    pub const fn new(max_attempts: NonZeroU32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Policy that tries exactly once.
    #[must_use]
    pub const fn once() -> Self {
        Self::new(NonZeroU32::MIN, Duration::ZERO)
    }

    /// Returns the maximum number of attempts.
    #[must_use]
    pub const fn max_attempts(self) -> u32 {
        self.max_attempts.get()
    }

    /// Returns the delay between attempts.
    #[must_use]
    pub const fn delay(self) -> Duration {
        self.delay
    }

    /// Runs `operation` until it succeeds or the attempts are exhausted.
    ///
    /// The closure receives the 1-based attempt number. There is no delay
    /// after the final attempt.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt.
    pub async fn run<T, E, F, Fut>(self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.get();
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max_attempts => {
                    warn!(
                        operation = label,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(operation = label, attempt, error = %err, "all attempts failed");
                    return Err(err);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}
