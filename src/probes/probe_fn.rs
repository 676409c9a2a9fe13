//! # Function-backed probe (`ProbeFn`)
//!
//! [`ProbeFn`] wraps a closure `F: Fn(Arc<str>, CancellationToken) -> Fut`,
//! producing a fresh future per attempt. Shared state between attempts (for
//! example a counter in a test) must be captured explicitly through `Arc<...>`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use preloadvisor::{ProbeFn, ProbeRef, ProbeError};
//!
//! let p: ProbeRef = ProbeFn::arc("head", |id: Arc<str>, _ctx: CancellationToken| async move {
//!     if id.ends_with(".mp4") {
//!         Ok(())
//!     } else {
//!         Err(ProbeError::fatal("unsupported container"))
//!     }
//! });
//!
//! assert_eq!(p.name(), "head");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;
use crate::probes::probe::{BoxProbeFuture, Probe};

/// Function-backed probe implementation.
#[derive(Debug)]
pub struct ProbeFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ProbeFn<F> {
    /// Creates a new function-backed probe.
    ///
    /// Prefer [`ProbeFn::arc`] when you immediately need a [`ProbeRef`](crate::ProbeRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the probe and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Probe for ProbeFn<F>
where
    F: Fn(Arc<str>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ProbeError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn probe(&self, id: Arc<str>, ctx: CancellationToken) -> BoxProbeFuture {
        Box::pin((self.f)(id, ctx))
    }
}
