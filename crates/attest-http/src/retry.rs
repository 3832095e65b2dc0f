//! Retry/backoff math for the HTTP request subsystem (§4.2 Retry algorithm).
//!
//! The shape (linear vs. exponential delay, attempt-bounded loop) follows
//! provider retry modules elsewhere in this workspace, generalized to a
//! caller-supplied status set instead of a fixed provider-retry predicate.

use crate::config::RetryConfig;

/// Computes the delay before the next attempt, given the attempt number
/// that just failed (1-based: `attempt == 1` is the delay before the first
/// retry).
pub fn next_delay_ms(config: &RetryConfig, attempt: u32) -> u64 {
    if !config.exponential_backoff {
        return config.retry_delay_ms;
    }
    let shift = attempt.saturating_sub(1).min(20);
    let scaled = config.retry_delay_ms.saturating_mul(1_u64 << shift);
    scaled.min(config.max_backoff_delay_ms)
}

/// `maxAttempts = maxRetries + 1`.
pub fn max_attempts(config: &RetryConfig) -> u32 {
    config.max_retries.saturating_add(1)
}

pub fn should_retry_status(config: &RetryConfig, status: u16) -> bool {
    config.retry_on_status.contains(&status)
}
