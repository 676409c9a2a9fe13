//! # Event subscribers.
//!
//! Observers of a [`Preloader`](crate::Preloader). They see the event stream
//! published on the [`Bus`](crate::events::Bus) but never influence
//! scheduling; caller notifications go through [`Callbacks`](crate::Callbacks).
//!
//! ```text
//! Bus ──► subscriber_listener ──► SubscriberSet ──┬──► [queue] ──► ActiveTracker
//!                                                 ├──► [queue] ──► LogWriter (feature "logging")
//!                                                 └──► [queue] ──► custom Subscribe impls
//! ```

mod embedded;
mod set;
mod subscribe;

pub use embedded::ActiveTracker;
#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
