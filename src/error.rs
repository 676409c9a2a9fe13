//! Error types used by the preloader runtime and probes.
//!
//! This module defines three error enums:
//!
//! - [`ProbeError`]: errors raised by a single probe attempt.
//! - [`ConfigError`]: rejected [`PreloadConfig`](crate::PreloadConfig) values.
//! - [`RuntimeError`]: errors raised by the preloader lifecycle itself.
//!
//! All of them provide `as_label` for logs/metrics. [`ProbeError`] additionally
//! knows whether it may be retried and which [`FailReason`] it maps to.

use std::time::Duration;
use thiserror::Error;

use crate::outcome::FailReason;

/// # Errors produced by a probe attempt.
///
/// Some errors are retryable (`Timeout`, `Failed`), `Fatal` is not.
/// `Canceled` is never reported to the caller.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Probe did not resolve within the configured timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Resource could not be loaded but may succeed if retried.
    #[error("probe failed: {reason}")]
    Failed {
        /// Underlying failure message.
        reason: String,
    },

    /// Resource is permanently unusable (should not be retried).
    #[error("fatal probe error (no retry): {reason}")]
    Fatal {
        /// Underlying failure message.
        reason: String,
    },

    /// Probe observed its cancellation token and gave up.
    #[error("probe cancelled")]
    Canceled,
}

impl ProbeError {
    /// Shorthand for a retryable failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        ProbeError::Failed {
            reason: reason.into(),
        }
    }

    /// Shorthand for a non-retryable failure.
    pub fn fatal(reason: impl Into<String>) -> Self {
        ProbeError::Fatal {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use preloadvisor::ProbeError;
    /// use std::time::Duration;
    ///
    /// let err = ProbeError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "probe_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ProbeError::Timeout { .. } => "probe_timeout",
            ProbeError::Failed { .. } => "probe_failed",
            ProbeError::Fatal { .. } => "probe_fatal",
            ProbeError::Canceled => "probe_canceled",
        }
    }

    /// Indicates whether another attempt may be made.
    ///
    /// # Example
    /// ```
    /// use preloadvisor::ProbeError;
    ///
    /// assert!(ProbeError::failed("503").is_retryable());
    /// assert!(!ProbeError::fatal("404").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProbeError::Failed { .. } | ProbeError::Timeout { .. })
    }

    /// Reason reported to `on_fail` when this error ends a task.
    ///
    /// Only a timeout maps to [`FailReason::Timeout`]; every other error
    /// (including a cancellation the runtime did not ask for) is [`FailReason::Error`].
    pub fn fail_reason(&self) -> FailReason {
        match self {
            ProbeError::Timeout { .. } => FailReason::Timeout,
            _ => FailReason::Error,
        }
    }
}

/// # Rejected configuration values.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_concurrent` must be at least 1.
    #[error("max_concurrent must be positive")]
    ZeroConcurrency,

    /// `timeout` must be longer than zero.
    #[error("timeout must be positive")]
    ZeroTimeout,

    /// `retry.max_attempts` must be at least 1.
    #[error("retry.max_attempts must be positive")]
    ZeroAttempts,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroConcurrency => "config_zero_concurrency",
            ConfigError::ZeroTimeout => "config_zero_timeout",
            ConfigError::ZeroAttempts => "config_zero_attempts",
        }
    }
}

/// # Errors produced by the preloader lifecycle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration was rejected by [`PreloadConfig::validate`](crate::PreloadConfig::validate).
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A run was started outside of a tokio runtime.
    #[error("no tokio runtime available to drive the preloader")]
    NoRuntime,

    /// The scheduler loop panicked or was aborted before it could be joined.
    #[error("scheduler loop did not exit cleanly: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use preloadvisor::{ConfigError, RuntimeError};
    ///
    /// let err = RuntimeError::from(ConfigError::ZeroTimeout);
    /// assert_eq!(err.as_label(), "runtime_config");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Config(_) => "runtime_config",
            RuntimeError::NoRuntime => "runtime_missing",
            RuntimeError::Join(_) => "runtime_join",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_timeout_reason() {
        let err = ProbeError::Timeout {
            timeout: Duration::from_millis(100),
        };
        assert_eq!(err.fail_reason(), FailReason::Timeout);
        assert!(err.is_retryable());
    }

    #[test]
    fn everything_else_maps_to_error_reason() {
        assert_eq!(ProbeError::failed("x").fail_reason(), FailReason::Error);
        assert_eq!(ProbeError::fatal("x").fail_reason(), FailReason::Error);
        assert_eq!(ProbeError::Canceled.fail_reason(), FailReason::Error);
    }

    #[test]
    fn only_failed_and_timeout_are_retryable() {
        assert!(!ProbeError::Canceled.is_retryable());
        assert!(!ProbeError::fatal("gone").is_retryable());
        assert!(ProbeError::failed("flaky").is_retryable());
    }
}
