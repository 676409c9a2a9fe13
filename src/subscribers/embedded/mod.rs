//! # Built-in subscribers
//!
//! - [`ActiveTracker`]: live set of identifiers in flight, plus peak concurrency.
//! - [`LogWriter`]: forwards every event to `tracing` (feature `logging`).

mod active;
#[cfg(feature = "logging")]
mod log;

pub use active::ActiveTracker;
#[cfg(feature = "logging")]
pub use log::LogWriter;
