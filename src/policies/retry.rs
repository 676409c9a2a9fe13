//! # Retry policy for probe attempts.
//!
//! [`RetryPolicy`] bounds how many attempts one identifier gets before it is
//! reported as failed. The default is two attempts (one retry).
//!
//! ```text
//! attempt 1 ──► Err(retryable) ──► attempt < max_attempts ──► backoff ──► attempt 2
//! attempt 2 ──► Err(any)       ──► attempt == max_attempts ──► on_fail
//! attempt n ──► Err(Fatal)     ──► never retried           ──► on_fail
//! ```

use crate::error::ProbeError;

/// Policy controlling how many times a failed probe is attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per identifier, including the first (`>= 1`).
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    /// Returns `max_attempts = 2`.
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

impl RetryPolicy {
    /// Single attempt, never retried.
    pub const fn never() -> Self {
        Self { max_attempts: 1 }
    }

    /// Returns true if `err`, observed on `attempt` (1-based), earns another attempt.
    pub fn allows_another(&self, attempt: u32, err: &ProbeError) -> bool {
        err.is_retryable() && attempt < self.max_attempts
    }
}
