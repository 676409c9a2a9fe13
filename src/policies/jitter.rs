//! # Jitter policy for retry delays.
//!
//! [`JitterPolicy`] adds randomness to backoff delays so that a batch of
//! identifiers that failed together does not retry in lockstep.
//!
//! - [`JitterPolicy::None`]: no randomization, predictable delays
//! - [`JitterPolicy::Full`]: random delay in [0, backoff_delay]
//! - [`JitterPolicy::Equal`]: delay = backoff_delay/2 + random[0, backoff_delay/2]

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of retry delays.
///
/// ## Trade-offs
/// - **None**: Predictable, required when tests drive a paused clock
/// - **Full**: Maximum spread, can shorten the wait to zero
/// - **Equal**: Keeps at least half of the computed delay
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use exact backoff delay.
    #[default]
    None,

    /// Full jitter: random delay in [0, backoff_delay].
    Full,

    /// Equal jitter: delay = backoff_delay/2 + random[0, backoff_delay/2].
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => full_jitter(delay),
            JitterPolicy::Equal => equal_jitter(delay),
        }
    }
}

/// Full jitter: random[0, delay]
fn full_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ms))
}

/// Equal jitter: delay/2 + random[0, delay/2]
fn equal_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    let half = ms / 2;
    let jitter = if half == 0 {
        0
    } else {
        rand::rng().random_range(0..=half)
    };
    Duration::from_millis(half + jitter)
}
