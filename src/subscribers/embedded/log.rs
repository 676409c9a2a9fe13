//! # LogWriter: events to `tracing`
//!
//! A minimal subscriber that forwards every [`Event`] to the `tracing`
//! facade under the `preloadvisor::events` target. Install any
//! `tracing-subscriber` layer to see them.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO preloadvisor::events: started run=1 ids=4
//! DEBUG preloadvisor::events: starting id=v1 attempt=1 run=1
//! WARN preloadvisor::events: timeout id=slow attempt=1 timeout_ms=100 run=1
//! DEBUG preloadvisor::events: backoff id=slow attempt=1 delay_ms=2000 reason="timeout after 100ms"
//! INFO preloadvisor::events: ready id=v1 attempt=1 run=1
//! WARN preloadvisor::events: failed id=bad attempt=2 reason=error run=1
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "preloadvisor::events";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let id = e.id.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        let run = e.run.unwrap_or_default();
        let attempt = e.attempt.unwrap_or_default();

        match e.kind {
            EventKind::PreloadStarted => info!(target: TARGET, run, ids = reason, "started"),
            EventKind::PreloadRestarted => info!(target: TARGET, run, "restarted"),
            EventKind::PreloadDetached => info!(target: TARGET, run, "detached"),
            EventKind::Quiescent => info!(target: TARGET, run, "quiescent"),
            EventKind::ProbeStarting => debug!(target: TARGET, id, attempt, run, "starting"),
            EventKind::ProbeSucceeded => debug!(target: TARGET, id, attempt, run, "succeeded"),
            EventKind::ProbeFailed => debug!(target: TARGET, id, attempt, reason, run, "attempt failed"),
            EventKind::TimeoutHit => {
                warn!(target: TARGET, id, attempt, timeout_ms = e.timeout_ms, run, "timeout")
            }
            EventKind::BackoffScheduled => {
                debug!(target: TARGET, id, attempt, delay_ms = e.delay_ms, reason, "backoff")
            }
            EventKind::ResourceReady => info!(target: TARGET, id, attempt, run, "ready"),
            EventKind::ResourceFailed => warn!(target: TARGET, id, attempt, reason, run, "failed"),
            EventKind::ProbeCancelled => debug!(target: TARGET, id, run, "cancelled"),
            EventKind::CallbackPanicked => warn!(target: TARGET, id, reason, run, "callback panicked"),
            EventKind::SubscriberOverflow => warn!(target: TARGET, subscriber = id, reason, "subscriber overflow"),
            EventKind::SubscriberPanicked => warn!(target: TARGET, subscriber = id, reason, "subscriber panicked"),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
