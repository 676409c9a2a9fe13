use std::sync::Arc;

use tokio::runtime::Handle;

use super::{callbacks::Callbacks, config::PreloadConfig, preloader::Preloader};
use crate::{
    error::RuntimeError,
    events::Bus,
    outcome::FailReason,
    probes::ProbeRef,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Preloader`].
pub struct PreloaderBuilder {
    cfg: PreloadConfig,
    probe: ProbeRef,
    callbacks: Callbacks,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl PreloaderBuilder {
    /// Creates a new builder with the given configuration and probe.
    pub fn new(cfg: PreloadConfig, probe: ProbeRef) -> Self {
        Self {
            cfg,
            probe,
            callbacks: Callbacks::default(),
            subscribers: Vec::new(),
        }
    }

    /// Sets the callback invoked once per identifier confirmed usable.
    pub fn on_ready<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks = self.callbacks.on_ready(f);
        self
    }

    /// Sets the callback invoked once per identifier that exhausted its attempts.
    pub fn on_fail<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, FailReason) + Send + Sync + 'static,
    {
        self.callbacks = self.callbacks.on_fail(f);
        self
    }

    /// Replaces both callbacks at once.
    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive preloader events through dedicated workers with
    /// bounded queues; they never delay dispatch or caller callbacks.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates the configuration and builds the [`Preloader`].
    ///
    /// Must be called from within a tokio runtime; the preloader keeps a
    /// handle to it, so later calls to [`Preloader::preload`] may come from
    /// any thread.
    pub fn build(self) -> Result<Preloader, RuntimeError> {
        self.cfg.validate()?;
        let runtime = Handle::try_current().map_err(|_| RuntimeError::NoRuntime)?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));

        Ok(Preloader::new_internal(
            self.cfg,
            self.probe,
            self.callbacks,
            bus,
            subs,
            runtime,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    use crate::error::{ConfigError, ProbeError};
    use crate::probes::ProbeFn;

    fn probe() -> ProbeRef {
        ProbeFn::arc("ok", |_id: Arc<str>, _ctx: CancellationToken| async {
            Ok::<(), ProbeError>(())
        })
    }

    #[test]
    fn build_outside_runtime_fails() {
        let res = PreloaderBuilder::new(PreloadConfig::default(), probe()).build();
        assert!(matches!(res, Err(RuntimeError::NoRuntime)));
    }

    #[tokio::test]
    async fn build_rejects_invalid_config() {
        let cfg = PreloadConfig::default().with_max_concurrent(0);
        let res = PreloaderBuilder::new(cfg, probe()).build();
        assert!(matches!(
            res,
            Err(RuntimeError::Config(ConfigError::ZeroConcurrency))
        ));
    }

    #[tokio::test]
    async fn build_starts_idle() {
        let p = PreloaderBuilder::new(PreloadConfig::default(), probe())
            .build()
            .unwrap();
        assert!(p.is_idle());
        assert!(p.current_request().is_none());
    }
}
