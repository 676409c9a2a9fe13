//! # Core preloader components.
//!
//! - [`Preloader`] binds runs to the caller's changing requests (lifecycle controller).
//! - [`PreloaderBuilder`] validates the configuration and wires the bus and subscribers.
//! - [`PreloadConfig`] holds the concurrency bound, timeout and policies.
//! - [`Callbacks`] carries the caller's `on_ready` / `on_fail` closures.
//! - [`DisposeHandle`] / [`start_preload`] is the one-shot entry point.
//!
//! Internal:
//! - `scheduler` owns one run's pending queue and active set and pumps dispatches.
//! - `registry` is the abort registry (one token + join handle per identifier in flight).
//! - `actor` drives one identifier through its attempts and backoff.
//! - `runner` executes a single attempt against the timeout.
//!
//! ```text
//! Preloader ──► Scheduler (1 per run) ──► ProbeActor (1 per id in flight) ──► run_once ──► Probe
//!                  ▲    │                      │
//!                  │    └─ AbortRegistry ◄─────┘ (cancel on restart/detach)
//!                  └────── Report (mpsc) ──────┘
//! ```

mod actor;
mod builder;
mod callbacks;
mod config;
mod handle;
mod preloader;
mod registry;
mod runner;
mod scheduler;
mod task;

pub use builder::PreloaderBuilder;
pub use callbacks::{Callbacks, OnFail, OnReady};
pub use config::PreloadConfig;
pub use handle::{DisposeHandle, start_preload};
pub use preloader::Preloader;
