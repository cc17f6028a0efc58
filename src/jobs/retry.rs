//! Retry backoff policy.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff settings: `min(base * 2^(attempt-1), max) + jitter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap applied after the exponential term.
    pub max_delay: Duration,
    /// Upper bound (exclusive) of the uniform jitter added on top.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(300),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Computes the delay before the given attempt (1-indexed) may run again.
    ///
    /// The jitter spreads out retries so a burst of failures does not
    /// produce a burst of simultaneous retries. No RNG call is made when
    /// `max_jitter` is zero.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63);
        let delay = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max_delay);

        let jitter = if self.max_jitter.is_zero() {
            Duration::ZERO
        } else {
            let nanos = rand::thread_rng().gen_range(0..self.max_jitter.as_nanos() as u64);
            Duration::from_nanos(nanos)
        };

        delay + jitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base_ms: u64, max_ms: u64, jitter_ms: u64) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(max_ms),
            max_jitter: Duration::from_millis(jitter_ms),
        }
    }

    #[test]
    fn doubles_until_capped() {
        let p = policy(2000, 300_000, 0);
        assert_eq!(p.backoff(1), Duration::from_secs(2));
        assert_eq!(p.backoff(2), Duration::from_secs(4));
        assert_eq!(p.backoff(3), Duration::from_secs(8));
        assert_eq!(p.backoff(5), Duration::from_secs(32));
        assert_eq!(p.backoff(10), Duration::from_secs(300));
        assert_eq!(p.backoff(60), Duration::from_secs(300));
    }

    #[test]
    fn non_decreasing_then_flat() {
        let p = policy(10, 50, 0);
        let mut previous = Duration::ZERO;
        for attempt in 1..=20 {
            let delay = p.backoff(attempt);
            assert!(delay >= previous, "backoff decreased at attempt {attempt}");
            assert!(delay <= p.max_delay);
            previous = delay;
        }
        assert_eq!(previous, p.max_delay);
    }

    #[test]
    fn jitter_stays_in_bounds() {
        let p = policy(100, 10_000, 50);
        for attempt in 1..=6 {
            let floor = Duration::from_millis(100 * (1 << (attempt - 1))).min(p.max_delay);
            for _ in 0..100 {
                let delay = p.backoff(attempt);
                assert!(delay >= floor);
                assert!(delay < floor + p.max_jitter);
            }
        }
    }

    #[test]
    fn huge_attempt_does_not_overflow() {
        let p = policy(2000, 300_000, 0);
        assert_eq!(p.backoff(u32::MAX), Duration::from_secs(300));
    }
}
