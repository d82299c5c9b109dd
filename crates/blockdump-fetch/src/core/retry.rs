use std::time::Duration;

use rand::Rng;

/// Calculate the delay before a retry attempt using exponential backoff.
///
/// The delay formula is: `base * 2^retry_count`
///
/// # Arguments
///
/// * `retry_count` - The current retry number (0-indexed: 0 = first retry)
/// * `base` - The base delay duration
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use blockdump_fetch::retry_delay;
///
/// assert_eq!(retry_delay(0, Duration::from_millis(500)), Duration::from_millis(500));
/// assert_eq!(retry_delay(1, Duration::from_millis(500)), Duration::from_secs(1));
/// assert_eq!(retry_delay(2, Duration::from_millis(500)), Duration::from_secs(2));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    // Use saturating_pow to prevent overflow
    let multiplier = 2_u32.saturating_pow(retry_count);

    // Use saturating_mul to prevent Duration overflow
    base.saturating_mul(multiplier)
}

/// Capped exponential backoff with uniform jitter and a bounded attempt count.
///
/// `delay(a) = min(ceiling, base * 2^(a-1)) + U(0, jitter_max)` for attempt `a >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base:         Duration,
    pub ceiling:      Duration,
    pub jitter_max:   Duration,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base:         Duration::from_millis(500),
            ceiling:      Duration::from_secs(60),
            jitter_max:   Duration::from_millis(500),
            max_attempts: 8,
        }
    }
}

impl BackoffPolicy {
    /// Deterministic part of the delay after `attempt` failed.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        retry_delay(attempt.saturating_sub(1), self.base).min(self.ceiling)
    }

    /// Full delay after `attempt` failed, jitter included.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay(attempt) + self.jitter()
    }

    /// Whether another attempt may follow `attempt`.
    ///
    /// Never true once cancellation has been requested.
    pub fn should_retry(&self, attempt: u32, cancelled: bool) -> bool {
        !cancelled && attempt < self.max_attempts
    }

    fn jitter(&self) -> Duration {
        if self.jitter_max.is_zero() {
            return Duration::ZERO;
        }
        let nanos = rand::thread_rng().gen_range(0..=self.jitter_max.as_nanos() as u64);
        Duration::from_nanos(nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_basic() {
        let base = Duration::from_millis(100);

        assert_eq!(retry_delay(0, base), Duration::from_millis(100));
        assert_eq!(retry_delay(1, base), Duration::from_millis(200));
        assert_eq!(retry_delay(2, base), Duration::from_millis(400));
        assert_eq!(retry_delay(3, base), Duration::from_millis(800));
    }

    #[test]
    fn test_retry_delay_overflow_protection() {
        let base = Duration::from_secs(u64::MAX / 2);

        let delay = retry_delay(40, base);
        assert!(delay > Duration::from_secs(0));
    }

    #[test]
    fn test_base_delay_is_capped() {
        let policy = BackoffPolicy::default();

        assert_eq!(policy.base_delay(1), Duration::from_millis(500));
        assert_eq!(policy.base_delay(2), Duration::from_secs(1));
        assert_eq!(policy.base_delay(8), Duration::from_secs(60));
        assert_eq!(policy.base_delay(200), Duration::from_secs(60));
    }

    #[test]
    fn test_delay_within_bounds() {
        let policy = BackoffPolicy::default();

        for attempt in 1..=40 {
            let lower = policy.base_delay(attempt);
            let upper = lower + policy.jitter_max;
            for _ in 0..50 {
                let d = policy.delay(attempt);
                assert!(d >= lower && d <= upper, "attempt {attempt}: {d:?} not in [{lower:?}, {upper:?}]");
            }
        }
    }

    #[test]
    fn test_zero_jitter_is_deterministic() {
        let policy = BackoffPolicy {
            jitter_max: Duration::ZERO,
            ..BackoffPolicy::default()
        };
        assert_eq!(policy.delay(3), Duration::from_secs(2));
    }

    #[test]
    fn test_should_retry() {
        let policy = BackoffPolicy::default();

        assert!(policy.should_retry(1, false));
        assert!(policy.should_retry(7, false));
        assert!(!policy.should_retry(8, false));
        assert!(!policy.should_retry(1, true));
    }
}
