//! Retry delay strategies

use crate::types::{RetryPolicy, RetryStrategy};
use std::time::Duration;

/// Calculate the delay before the attempt following `attempt`
///
/// # Arguments
///
/// * `policy` - The retry policy containing strategy and timing parameters
/// * `attempt` - The attempt that just failed (1-indexed)
///
/// # Example
///
/// ```rust
/// use apiprobe_core::retry::calculate_delay;
/// use apiprobe_core::types::{RetryPolicy, RetryStrategy};
///
/// let policy = RetryPolicy {
///     max_attempts: 3,
///     strategy: RetryStrategy::ExponentialBackoff,
///     backoff_multiplier: 2.0,
///     delay_ms: 1000,
///     max_delay_ms: 30000,
/// };
///
/// assert_eq!(calculate_delay(&policy, 1).as_millis(), 1000);
/// assert_eq!(calculate_delay(&policy, 2).as_millis(), 2000);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    // Attempt is 1-indexed, but we want 0-indexed for calculations
    let attempt_index = attempt.saturating_sub(1);

    let base_delay_ms = match policy.strategy {
        RetryStrategy::None => 0,

        RetryStrategy::FixedDelay => policy.delay_ms,

        RetryStrategy::ExponentialBackoff => {
            let multiplier = policy.backoff_multiplier.powf(attempt_index as f64);
            (policy.delay_ms as f64 * multiplier) as u64
        }

        RetryStrategy::LinearBackoff => policy
            .delay_ms
            .saturating_mul(attempt_index as u64 + 1),
    };

    Duration::from_millis(base_delay_ms.min(policy.max_delay_ms))
}

/// Whether a loop should sleep after `attempt` failed
///
/// Never after the final attempt, and never for a zero delay.
pub fn should_sleep(policy: &RetryPolicy, attempt: u32, delay: Duration) -> bool {
    attempt < policy.max_attempts && !delay.is_zero()
}
