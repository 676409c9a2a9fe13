//! # preloadvisor
//!
//! **Preloadvisor** is a bounded concurrent resource preloader.
//!
//! Given an ordered list of resource identifiers (media URLs, asset paths,
//! ...), it confirms each one is usable by running a caller-supplied
//! [`Probe`] with a concurrency bound, a per-attempt timeout, a retry with
//! backoff, and silent cancellation when the caller's input changes.
//! Every identifier ends with exactly one caller notification: `on_ready(id)`
//! or `on_fail(id, reason)` with `reason` one of `"timeout"` / `"error"`,
//! unless the run was cancelled first.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller ── preload(["v1","v2","v3","v4"]) ──► Preloader (lifecycle controller)
//!                                                  │  same content → no-op
//!                                                  │  new content  → cancel old run, start new run
//!                                                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler (one loop task per run)                                │
//! │  - PendingQueue (FIFO of ids not yet dispatched)                  │
//! │  - AbortRegistry (= ActiveSet, one token per id in flight)        │
//! │  - pump(): while |active| < max_concurrent → dispatch head        │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼         ▲
//!     ┌──────────────┐   ┌──────────────┐   ┌─────────┐  │ Report::Retrying
//!     │  ProbeActor  │   │  ProbeActor  │   │   ...   │  │ Report::Finished ──► on_ready / on_fail
//!     │ (retry loop) │   │ (retry loop) │   │         │──┘
//!     └┬─────────────┘   └┬─────────────┘   └─────────┘
//!      │ run_once(probe, timeout)
//!      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       subscriber_listener ──► SubscriberSet ──► ActiveTracker, LogWriter, ...
//! ```
//!
//! ### Lifecycle of one identifier
//! ```text
//! Pending ──pump──► Loading ──Ok──────────────────────────► Succeeded → on_ready(id)
//!                     │  └─timeout/error, attempts left ──► Retrying ──backoff──► Loading
//!                     └────timeout/error, none left ──────► Failed → on_fail(id, reason)
//! restart / detach: Pending dropped, Loading/Retrying aborted, no callback
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                            |
//! |-------------------|-----------------------------------------------------------------|-----------------------------------------------|
//! | **Lifecycle**     | Activate, restart on new input, detach, graceful shutdown.      | [`Preloader`], [`DisposeHandle`]              |
//! | **Probes**        | Plug in how an identifier is confirmed usable.                  | [`Probe`], [`ProbeFn`], [`ProbeRef`]          |
//! | **Policies**      | Attempts, backoff growth and jitter.                            | [`RetryPolicy`], [`BackoffPolicy`]            |
//! | **Configuration** | Concurrency bound, timeout, policies.                           | [`PreloadConfig`]                             |
//! | **Errors**        | Typed errors for probes, configuration and lifecycle.           | [`ProbeError`], [`ConfigError`], [`RuntimeError`] |
//! | **Observability** | Event stream with pluggable subscribers.                        | [`Event`], [`Subscribe`], [`ActiveTracker`]   |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber that forwards events to `tracing`.
//! - `http`: exports [`HttpProbe`], a range-request probe built on `reqwest`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use preloadvisor::{start_preload, Callbacks, PreloadConfig, ProbeError, ProbeFn, ProbeRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let probe: ProbeRef = ProbeFn::arc("fake", |id: Arc<str>, ctx: CancellationToken| async move {
//!         tokio::select! {
//!             _ = ctx.cancelled() => Err(ProbeError::Canceled),
//!             _ = tokio::time::sleep(Duration::from_millis(5)) => {
//!                 if id.ends_with(".mp4") { Ok(()) } else { Err(ProbeError::fatal("unsupported")) }
//!             }
//!         }
//!     });
//!
//!     let callbacks = Callbacks::new()
//!         .on_ready(|id| println!("ready {id}"))
//!         .on_fail(|id, reason| println!("failed {id}: {reason}"));
//!
//!     let handle = start_preload(
//!         vec!["intro.mp4", "broll.mp4", "notes.txt"],
//!         PreloadConfig::default().with_max_concurrent(2),
//!         probe,
//!         callbacks,
//!     )?;
//!
//!     while !handle.is_idle() {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!     }
//!     handle.dispose_and_wait().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod outcome;
mod policies;
mod probes;
mod request;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    Callbacks, DisposeHandle, OnFail, OnReady, PreloadConfig, Preloader, PreloaderBuilder,
    start_preload,
};
pub use error::{ConfigError, ProbeError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use outcome::{FailReason, Outcome};
pub use policies::{BackoffPolicy, JitterPolicy, RetryPolicy};
pub use probes::{BoxProbeFuture, Probe, ProbeFn, ProbeRef};
pub use request::PreloadRequest;
pub use subscribers::{ActiveTracker, Subscribe, SubscriberSet};

// Optional: expose a tracing-backed logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

// Optional: expose an HTTP range-request probe.
// Enable with: `--features http`
#[cfg(feature = "http")]
pub use probes::HttpProbe;
