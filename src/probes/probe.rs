//! # Resource-probe capability.
//!
//! A [`Probe`] begins loading just enough of a resource to confirm it is usable.
//! The three operations of the capability map onto one future:
//!
//! ```text
//! begin(id)           ──► probe.probe(id, ctx)        (returns a future)
//! handle.abort()      ──► ctx.cancel() + future dropped
//! succeeded           ──► future resolves Ok(())
//! failed(reason)      ──► future resolves Err(ProbeError)
//! ```
//!
//! The runtime owns timeouts: a probe does not need its own deadline and may
//! run forever; it is dropped when the attempt's timeout elapses.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;

/// Boxed future returned by [`Probe::probe`].
pub type BoxProbeFuture = Pin<Box<dyn Future<Output = Result<(), ProbeError>> + Send + 'static>>;

/// Shared handle to a probe implementation.
pub type ProbeRef = Arc<dyn Probe>;

/// # Asynchronous, abortable resource check.
///
/// Each call to [`probe`](Probe::probe) is one attempt and must create a fresh
/// future that owns its state. Implementations should watch `ctx` and return
/// [`ProbeError::Canceled`] promptly once it fires; the runtime also drops the
/// future, so a probe that never checks `ctx` is still aborted.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
/// use preloadvisor::{BoxProbeFuture, Probe, ProbeError};
///
/// struct AlwaysThere;
///
/// impl Probe for AlwaysThere {
///     fn name(&self) -> &str { "always-there" }
///
///     fn probe(&self, _id: Arc<str>, ctx: CancellationToken) -> BoxProbeFuture {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(ProbeError::Canceled);
///             }
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Probe: Send + Sync + 'static {
    /// Human-readable probe name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Begins one attempt for `id`.
    fn probe(&self, id: Arc<str>, ctx: CancellationToken) -> BoxProbeFuture;
}
