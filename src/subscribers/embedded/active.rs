//! # ActiveTracker: identifiers currently in flight
//!
//! Maintains an in-memory set of **active** identifiers by listening to
//! [`EventKind::ProbeStarting`] and the events that end an identifier's life
//! in a run ([`EventKind::ResourceReady`], [`EventKind::ResourceFailed`],
//! [`EventKind::ProbeCancelled`]).
//!
//! Entries are keyed by `(run, id)`: the teardown of a replaced run is
//! asynchronous, so its `ProbeCancelled("b")` may arrive after the new run's
//! `ProbeStarting("b")` and must not remove it.
//!
//! ## Behavior
//! - Repeated start (a retry attempt) → idempotent.
//! - End without prior start → ignored (the start may have been dropped on overflow).
//!
//! ## Internal scheme
//! ```text
//! on_event(ev):
//!   ├─ ProbeStarting                          => insert((run, id)), peak = max(peak, len)
//!   ├─ ResourceReady | ResourceFailed | ProbeCancelled => remove((run, id))
//!   └─ otherwise: ignore
//! ```

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

#[derive(Default)]
struct State {
    active: HashSet<(u64, Arc<str>)>,
    peak: usize,
}

/// Tracks the set of identifiers with a probe in flight.
pub struct ActiveTracker {
    inner: RwLock<State>,
    capacity: usize,
}

impl ActiveTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(State::default()),
            capacity: 2048,
        }
    }

    /// Configure the queue capacity for this subscriber.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Sorted snapshot of the identifiers in flight, across runs.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<str>> {
        let g = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut v: Vec<Arc<str>> = g.active.iter().map(|(_, id)| id.clone()).collect();
        v.sort_unstable();
        v
    }

    /// Largest number of identifiers observed in flight at once.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .peak
    }
}

#[async_trait]
impl Subscribe for ActiveTracker {
    async fn on_event(&self, ev: &Event) {
        let (Some(id), Some(run)) = (ev.id.clone(), ev.run) else {
            return;
        };
        let mut g = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match ev.kind {
            EventKind::ProbeStarting => {
                g.active.insert((run, id));
                g.peak = g.peak.max(g.active.len());
            }
            EventKind::ResourceReady | EventKind::ResourceFailed | EventKind::ProbeCancelled => {
                g.active.remove(&(run, id));
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "ActiveTracker"
    }

    fn queue_capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ActiveTracker {
    fn default() -> Self {
        Self::new()
    }
}
