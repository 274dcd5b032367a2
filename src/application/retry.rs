// Retry policy - opt-in linear backoff around a single call
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Opt-in retry around a single call. Hooks never retry on their own.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before retry number `attempt` (1-based): grows linearly.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) if attempt >= self.max_attempts => {
                    warn!("Operation failed after {} attempts: {}", self.max_attempts, err);
                    return Err(err);
                }
                Err(err) => {
                    warn!("Operation failed (attempt {}): {}, retrying...", attempt, err);
                    sleep(self.delay_for(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
