//! # Events emitted by the preloader, its scheduler and probe actors.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Run events**: a request started, was replaced, was detached, or settled
//! - **Probe events**: one attempt's flow (starting, succeeded, failed, timeout, backoff)
//! - **Terminal events**: what the caller was told (`ResourceReady`, `ResourceFailed`)
//!   or that an identifier was silently cancelled
//! - **Observer events**: subscriber or callback misbehaviour
//!
//! The [`Event`] struct carries metadata such as timestamps, the identifier,
//! attempt number, reasons and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use preloadvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ProbeFailed)
//!     .with_id("https://cdn.example/clip.mp4")
//!     .with_reason("connection reset")
//!     .with_attempt(1)
//!     .with_timeout(Duration::from_secs(15));
//!
//! assert_eq!(ev.kind, EventKind::ProbeFailed);
//! assert_eq!(ev.reason.as_deref(), Some("connection reset"));
//! assert_eq!(ev.timeout_ms, Some(15_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of preloader events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Observer events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `id` (subscriber name), `reason` (panic info)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `id` (subscriber name), `reason` ("full" or "closed")
    SubscriberOverflow,

    /// A caller `on_ready`/`on_fail` callback panicked; the pipeline continued.
    ///
    /// Sets: `id`, `reason` (panic info), `run`
    CallbackPanicked,

    // === Run events ===
    /// A new request was enqueued and the first pump happened.
    ///
    /// Sets: `run`, `reason` (identifier count)
    PreloadStarted,

    /// A content-different request replaced the running one.
    ///
    /// Sets: `run` (the run being replaced)
    PreloadRestarted,

    /// The caller detached; everything pending or in flight was dropped.
    ///
    /// Sets: `run`
    PreloadDetached,

    /// Pending queue and active set are both empty.
    ///
    /// Sets: `run`
    Quiescent,

    // === Probe events ===
    /// A probe attempt is starting.
    ///
    /// Sets: `id`, `attempt` (1-based), `run`
    ProbeStarting,

    /// A probe attempt confirmed the resource is usable.
    ///
    /// Sets: `id`, `attempt`, `run`
    ProbeSucceeded,

    /// A probe attempt failed (timeout attempts also emit `TimeoutHit` first).
    ///
    /// Sets: `id`, `attempt`, `reason`, `run`
    ProbeFailed,

    /// A probe attempt exceeded the configured timeout and was aborted.
    ///
    /// Sets: `id`, `attempt`, `timeout_ms`, `run`
    TimeoutHit,

    /// Next attempt scheduled after a retryable failure.
    ///
    /// Sets: `id`, `attempt` (the failed one), `delay_ms`, `reason`, `run`
    BackoffScheduled,

    // === Terminal events ===
    /// `on_ready` is about to be invoked for this identifier.
    ///
    /// Sets: `id`, `attempt`, `run`
    ResourceReady,

    /// `on_fail` is about to be invoked for this identifier.
    ///
    /// Sets: `id`, `attempt`, `reason` ("timeout" or "error"), `run`
    ResourceFailed,

    /// An identifier in flight was aborted by restart or detach; no callback follows.
    ///
    /// Sets: `id`, `run`
    ProbeCancelled,
}

/// Preloader event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Resource identifier (or subscriber name for observer events).
    pub id: Option<Arc<str>>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Probe timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Backoff delay before next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, counts, overflow details).
    pub reason: Option<Arc<str>>,
    /// Run generation the event belongs to.
    pub run: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            id: None,
            attempt: None,
            timeout_ms: None,
            delay_ms: None,
            reason: None,
            run: None,
        }
    }

    /// Attaches a resource identifier.
    #[inline]
    pub fn with_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches the run generation.
    #[inline]
    pub fn with_run(mut self, run: u64) -> Self {
        self.run = Some(run);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_id(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_id(subscriber)
            .with_reason(info)
    }

    /// True for the two kinds that end an identifier's life with a callback.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::ResourceReady | EventKind::ResourceFailed)
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::ProbeStarting);
        let b = Event::new(EventKind::ProbeStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_are_saturated() {
        let ev = Event::new(EventKind::BackoffScheduled).with_delay(Duration::MAX);
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
