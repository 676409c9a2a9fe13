//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the preloader, its scheduler loop,
//! probe actors, the probe runner and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Preloader`, `Scheduler`, `ProbeActor`, `runner::run_once`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `Preloader::subscriber_listener()` (fans out to `SubscriberSet`).
//!
//! See `core/mod.rs` for the system-level wiring diagram.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
