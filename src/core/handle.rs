//! # One-shot entry point.
//!
//! [`start_preload`] builds a [`Preloader`], activates it with the given
//! identifiers and hands back a [`DisposeHandle`]. Dropping the handle has the
//! same effect as [`DisposeHandle::dispose`].

use std::ops::Deref;

use super::{callbacks::Callbacks, config::PreloadConfig, preloader::Preloader};
use crate::{error::RuntimeError, probes::ProbeRef, request::PreloadRequest};

/// Owner of a running preloader; disposing it detaches silently.
pub struct DisposeHandle {
    preloader: Preloader,
}

impl DisposeHandle {
    /// Aborts every probe in flight and discards everything pending.
    ///
    /// No callback is invoked afterwards for this activation. Idempotent.
    pub fn dispose(&self) {
        self.preloader.detach();
    }

    /// Like [`dispose`](Self::dispose), then waits until the scheduler loop
    /// and the subscriber workers have exited.
    pub async fn dispose_and_wait(self) -> Result<(), RuntimeError> {
        self.preloader.shutdown().await
    }
}

impl Deref for DisposeHandle {
    type Target = Preloader;

    fn deref(&self) -> &Preloader {
        &self.preloader
    }
}

impl Drop for DisposeHandle {
    fn drop(&mut self) {
        self.preloader.detach();
    }
}

/// Builds a preloader and starts preloading `ids`.
///
/// Must be called from within a tokio runtime.
pub fn start_preload(
    ids: impl Into<PreloadRequest>,
    config: PreloadConfig,
    probe: ProbeRef,
    callbacks: Callbacks,
) -> Result<DisposeHandle, RuntimeError> {
    let preloader = Preloader::builder(config, probe)
        .callbacks(callbacks)
        .build()?;
    preloader.preload(ids);
    Ok(DisposeHandle { preloader })
}
