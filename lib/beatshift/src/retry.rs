use std::{fmt::Display, future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Pause before the first attempt (milliseconds).
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 500;

/// Additional attempts after the first one fails.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Paced, exponentially backed-off execution of a single remote operation.
///
/// Every attempt, including the first, is preceded by a wait. The wait doubles after
/// each failure, with no jitter. Failures are not classified: any error is retried
/// until the budget runs out, and then the last error is returned unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(initial_delay: Duration, max_retries: u32) -> Self {
        Self {
            initial_delay,
            max_retries,
        }
    }

    /// Cumulative wait when every attempt fails: `initial_delay * (2^(R+1) - 1)`.
    pub fn exhausted_wait(&self) -> Duration {
        (0..=self.max_retries).fold(Duration::ZERO, |total, attempt| {
            total.saturating_add(self.delay_before(attempt))
        })
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        self.initial_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    pub async fn execute<T, E, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            let delay = self.delay_before(attempt);
            debug!(
                "{} attempt {}/{} after {}ms",
                operation_name,
                attempt + 1,
                attempts,
                delay.as_millis()
            );
            sleep(delay).await;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries => {
                    warn!(
                        "{} failed (attempt {}/{}), retrying in {}ms: {}",
                        operation_name,
                        attempt + 1,
                        attempts,
                        self.delay_before(attempt + 1).as_millis(),
                        e
                    );
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "{} failed after {} attempts: {}",
                        operation_name, attempts, e
                    );
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}
