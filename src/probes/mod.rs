//! # Probe abstractions.
//!
//! This module provides the resource-probe capability the scheduler drives:
//! - [`Probe`] - trait for confirming that one identifier is loadable
//! - [`ProbeFn`] - closure-backed probe implementation
//! - [`ProbeRef`] - shared reference to a probe (`Arc<dyn Probe>`)
//! - `HttpProbe` - range-request probe (feature `http`)

#[cfg(feature = "http")]
mod http;
mod probe;
mod probe_fn;

#[cfg(feature = "http")]
pub use http::HttpProbe;
pub use probe::{BoxProbeFuture, Probe, ProbeRef};
pub use probe_fn::ProbeFn;
