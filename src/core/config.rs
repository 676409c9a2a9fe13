//! # Preloader configuration.
//!
//! Provides [`PreloadConfig`], the settings shared by every run of a
//! [`Preloader`](crate::Preloader).
//!
//! There are no sentinel values: every bound is positive, and
//! [`PreloadConfig::validate`] rejects zeros instead of silently treating them
//! as "unlimited".

use std::time::Duration;

use crate::error::ConfigError;
use crate::policies::{BackoffPolicy, RetryPolicy};

/// Configuration for a preloader.
///
/// ## Field semantics
/// - `max_concurrent`: probes outstanding at once (`>= 1`)
/// - `timeout`: per-attempt deadline (`> 0`)
/// - `retry`: attempts per identifier
/// - `backoff`: delay before each retry
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreloadConfig {
    /// Maximum number of identifiers probed at the same time.
    pub max_concurrent: usize,

    /// Deadline for one probe attempt.
    ///
    /// When it elapses the attempt is aborted and counts as a `"timeout"` failure.
    pub timeout: Duration,

    /// How many attempts one identifier gets.
    pub retry: RetryPolicy,

    /// Delay between a failed attempt and the next one.
    pub backoff: BackoffPolicy,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Subscribers that lag behind more than `bus_capacity` events skip older ones.
    pub bus_capacity: usize,
}

impl PreloadConfig {
    /// Returns a copy with `max_concurrent` replaced.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Returns a copy with `timeout` replaced.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns a copy with `retry` replaced.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a copy with `backoff` replaced.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Checks that every bound is positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(())
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for PreloadConfig {
    /// Default configuration:
    ///
    /// - `max_concurrent = 3`
    /// - `timeout = 15s`
    /// - `retry = RetryPolicy::default()` (2 attempts)
    /// - `backoff = BackoffPolicy::default()` (2s × attempt)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            timeout: Duration::from_millis(15_000),
            retry: RetryPolicy::default(),
            backoff: BackoffPolicy::default(),
            bus_capacity: 1024,
        }
    }
}
