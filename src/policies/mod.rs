//! Retry and backoff policies.
//!
//! This module groups the knobs that control **whether** a failed probe is
//! attempted again and **how long** to wait before the next attempt.
//!
//! ## Contents
//! - [`RetryPolicy`]   how many attempts a single identifier gets
//! - [`BackoffPolicy`] how retry delays evolve (unit × attempt, capped, + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid synchronized retries
//!
//! ## Quick wiring
//! ```text
//! PreloadConfig { retry: RetryPolicy, backoff: BackoffPolicy, timeout: Duration }
//!      └─► core::actor::ProbeActor uses:
//!           - retry.allows_another(attempt, &err) to decide retry/fail
//!           - backoff.next(attempt) to schedule the next attempt
//! ```
//!
//! ## Defaults
//! - `RetryPolicy { max_attempts: 2 }` (one extra attempt).
//! - `BackoffPolicy::default()` → unit=2s, linear, max=30s, jitter=None.

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;
