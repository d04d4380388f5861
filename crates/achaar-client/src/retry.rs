//! Bounded exponential backoff for sends.

use std::time::Duration;

use achaar_core::config::ClientConfig;

use crate::error::SendError;

/// Retry budget and timing for one logical send.
///
/// Attempt `n` (zero-based) that fails with a retryable error is followed by
/// a wait of `base_delay * 2^n`, as long as `n < max_retries`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Client-side bound on each attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the retry that follows attempt `retry_count`.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry_count);
        self.base_delay.saturating_mul(factor)
    }

    pub fn should_retry(&self, error: &SendError, retry_count: u32) -> bool {
        error.is_retryable() && retry_count < self.max_retries
    }

    /// Status line shown while waiting to retry.
    pub fn retry_notice(&self, retry_count: u32) -> String {
        format!(
            "Connection issue. Retrying in {}s... ({}/{})",
            self.delay_for(retry_count).as_secs_f64(),
            retry_count + 1,
            self.max_retries
        )
    }

    /// Transcript text for a send that will not be retried.
    pub fn failure_message(&self, error_text: &str, retry_count: u32) -> String {
        if retry_count >= self.max_retries {
            format!(
                "❌ Error: {} (Failed after {} retries)",
                error_text, self.max_retries
            )
        } else {
            format!("❌ Error: {}", error_text)
        }
    }
}
