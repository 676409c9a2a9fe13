//! Terminal outcomes reported to the caller.

use std::fmt;

/// Why a resource permanently failed to preload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailReason {
    /// Every attempt exceeded the configured timeout (or the last one did).
    Timeout,
    /// The probe reported an error on its last attempt.
    Error,
}

impl FailReason {
    /// Stable wire name: `"timeout"` or `"error"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailReason::Timeout => "timeout",
            FailReason::Error => "error",
        }
    }
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The resource was confirmed usable.
    Ready,
    /// The resource could not be loaded within the retry budget.
    Failed(FailReason),
}

impl Outcome {
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready)
    }
}
