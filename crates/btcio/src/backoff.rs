use std::time::Duration;

use tracing::warn;

use crate::error::{BtcioError, Result};

/// Exponential back-off with a cap, used for every retryable base-chain RPC
/// call (spec.md §4.1 "Failure model"). Never mutates indexer state; it only
/// delays the next attempt.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            multiplier: 2,
            max_attempts: 8,
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait before retry attempt number `attempt` (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.initial_delay.saturating_mul(self.multiplier.saturating_pow(attempt));
        scaled.min(self.max_delay)
    }

    /// Runs `op` until it succeeds, a fatal error is returned, or
    /// `max_attempts` transient failures have been exhausted.
    pub async fn retry<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(err) if err.is_transient() && attempt + 1 < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(attempt, ?delay, %err, "retrying base-chain rpc call");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
