//! # Backoff policy for retrying probes.
//!
//! [`BackoffPolicy`] controls how long a failed identifier waits before its next
//! attempt. It is parameterized by:
//! - [`BackoffPolicy::unit`] the delay added per completed attempt;
//! - [`BackoffPolicy::max`] the maximum delay cap;
//! - [`BackoffPolicy::jitter`] randomization applied to the capped delay.
//!
//! The delay after attempt `n` (1-based) is `unit × n`, clamped to `max`, then
//! jitter is applied. Growth is linear: a one-off glitch resolves quickly while a
//! resource that keeps failing is not hammered.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use preloadvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     unit: Duration::from_millis(2000),
//!     max: Duration::from_secs(5),
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(1), Duration::from_millis(2000));
//! assert_eq!(backoff.next(2), Duration::from_millis(4000));
//! // 3 × 2s = 6s → capped at max=5s
//! assert_eq!(backoff.next(3), Duration::from_secs(5));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry backoff policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay added per completed attempt.
    pub unit: Duration,
    /// Maximum delay cap for retries.
    pub max: Duration,
    /// Jitter policy to spread retries of a batch.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns a strategy with:
    /// - `unit = 2000ms`;
    /// - `max = 30s`;
    /// - `jitter = None`.
    fn default() -> Self {
        Self {
            unit: Duration::from_millis(2000),
            max: Duration::from_secs(30),
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay to wait after `attempt` (1-based) before the next one.
    ///
    /// `attempt = 0` is treated as `1`, so the first retry always waits at
    /// least one `unit` (before jitter).
    pub fn next(&self, attempt: u32) -> Duration {
        let base = self
            .unit
            .checked_mul(attempt.max(1))
            .map_or(self.max, |d| d.min(self.max));
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(unit_ms: u64, max: Duration) -> BackoffPolicy {
        BackoffPolicy {
            unit: Duration::from_millis(unit_ms),
            max,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn test_default_first_retry_waits_one_unit() {
        assert_eq!(BackoffPolicy::default().next(1), Duration::from_millis(2000));
    }

    #[test]
    fn test_linear_growth_no_jitter() {
        let policy = linear(2000, Duration::from_secs(30));
        assert_eq!(policy.next(1), Duration::from_millis(2000));
        assert_eq!(policy.next(2), Duration::from_millis(4000));
        assert_eq!(policy.next(3), Duration::from_millis(6000));
        assert!(policy.next(2) > policy.next(1));
    }

    #[test]
    fn test_attempt_zero_is_one_unit() {
        let policy = linear(250, Duration::from_secs(30));
        assert_eq!(policy.next(0), Duration::from_millis(250));
    }

    #[test]
    fn test_clamped_to_max() {
        let policy = linear(2000, Duration::from_secs(3));
        assert_eq!(policy.next(10), Duration::from_secs(3));
    }

    #[test]
    fn test_overflow_clamps_to_max() {
        let policy = BackoffPolicy {
            unit: Duration::MAX,
            max: Duration::from_secs(10),
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_equal_jitter_bounds() {
        let policy = BackoffPolicy {
            unit: Duration::from_millis(1000),
            max: Duration::from_secs(30),
            jitter: JitterPolicy::Equal,
        };
        for _ in 0..50 {
            let delay = policy.next(1);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_full_jitter_never_exceeds_base() {
        let policy = BackoffPolicy {
            unit: Duration::from_millis(1000),
            max: Duration::from_secs(30),
            jitter: JitterPolicy::Full,
        };
        for attempt in 1..20 {
            assert!(policy.next(attempt) <= Duration::from_millis(1000 * attempt as u64));
        }
    }
}
