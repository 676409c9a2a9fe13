//! # Event bus for broadcasting preloader events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] used by every
//! component of a [`Preloader`](crate::Preloader) to report what it is doing.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                     Subscriber (one):
//!   Scheduler   ──┐
//!   ProbeActor  ──┼──────► Bus ───────► subscriber_listener ────► SubscriberSet
//!   run_once    ──┤  (broadcast chan)    (in Preloader)
//!   Preloader   ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: the scheduler loop never waits on observers.
//! - **Bounded capacity**: one ring buffer shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **Observers only**: caller callbacks never travel over the bus, so a lagging
//!   subscriber can lose events but never a `on_ready`/`on_fail` notification.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for preloader events.
///
/// Cheap to clone (internally an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receiver_sees_events_published_after_subscribe() {
        let bus = Bus::new(8);
        bus.publish(Event::new(EventKind::ProbeStarting).with_id("early"));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::ResourceReady).with_id("late"));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ResourceReady);
        assert_eq!(ev.id.as_deref(), Some("late"));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let bus = Bus::new(0);
        let _rx = bus.subscribe();
        bus.publish(Event::new(EventKind::Quiescent));
    }
}
