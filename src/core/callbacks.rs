//! # Caller notifications.
//!
//! [`Callbacks`] holds the optional `on_ready` / `on_fail` closures and invokes
//! them with panic isolation: a panicking callback is logged and reported as
//! [`EventKind::CallbackPanicked`](crate::EventKind::CallbackPanicked), and the
//! scheduler carries on with the rest of the batch.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::outcome::FailReason;

/// Invoked once for each identifier confirmed usable.
pub type OnReady = Arc<dyn Fn(&str) + Send + Sync>;

/// Invoked once for each identifier that exhausted its attempts.
pub type OnFail = Arc<dyn Fn(&str, FailReason) + Send + Sync>;

/// Pair of optional caller callbacks.
#[derive(Clone, Default)]
pub struct Callbacks {
    on_ready: Option<OnReady>,
    on_fail: Option<OnFail>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_ready", &self.on_ready.is_some())
            .field("on_fail", &self.on_fail.is_some())
            .finish()
    }
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `on_ready` callback.
    pub fn on_ready<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_ready = Some(Arc::new(f));
        self
    }

    /// Sets the `on_fail` callback.
    pub fn on_fail<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, FailReason) + Send + Sync + 'static,
    {
        self.on_fail = Some(Arc::new(f));
        self
    }

    /// Calls `on_ready(id)`. Returns the panic message if it panicked.
    pub(crate) fn ready(&self, id: &str) -> Result<(), String> {
        match &self.on_ready {
            Some(f) => isolate(|| f(id)),
            None => Ok(()),
        }
    }

    /// Calls `on_fail(id, reason)`. Returns the panic message if it panicked.
    pub(crate) fn fail(&self, id: &str, reason: FailReason) -> Result<(), String> {
        match &self.on_fail {
            Some(f) => isolate(|| f(id, reason)),
            None => Ok(()),
        }
    }
}

fn isolate(f: impl FnOnce()) -> Result<(), String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string())
    })
}
