//! # Preloader: binds the scheduler to the caller's changing input.
//!
//! The [`Preloader`] is the lifecycle controller. It owns the event bus, the
//! subscriber fan-out and at most one live run (a [`Scheduler`] loop for one
//! [`PreloadRequest`]). It never merges requests: a content-different request
//! tears the current run down and starts a fresh one.
//!
//! ## High-level architecture
//! ```text
//! preload(request):
//!   same content as live run ──► no-op
//!   otherwise:
//!     old run? ──► old.token.cancel()  (scheduler aborts actors, drops pending, silent)
//!              └─► publish PreloadRestarted
//!     run_token = root.child_token()
//!     Scheduler::new(..).enqueue_all(request.unique_ids())
//!     spawn(scheduler.run())  ──► publish PreloadStarted
//!
//! cancel(id): live run? ──► Control::Cancel(id) ──► scheduler drops/aborts id silently
//! detach():   live run? ──► token.cancel() ──► publish PreloadDetached
//! shutdown(): detach() + join the loop + flush subscribers
//! drop:       root.cancel() (every run token is a child of root)
//!
//! Event flow:
//!   Scheduler / ProbeActor / run_once ── publish ──► Bus ──► subscriber_listener ──► SubscriberSet
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use preloadvisor::{PreloadConfig, Preloader, ProbeError, ProbeFn, ProbeRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let probe: ProbeRef = ProbeFn::arc("instant", |_id: Arc<str>, _ctx: CancellationToken| async {
//!         Ok::<(), ProbeError>(())
//!     });
//!
//!     let preloader = Preloader::builder(PreloadConfig::default(), probe)
//!         .on_ready(|id| println!("ready: {id}"))
//!         .on_fail(|id, reason| println!("failed: {id} ({reason})"))
//!         .build()?;
//!
//!     preloader.preload(vec!["clip-1.mp4", "clip-2.mp4"]);
//!     while !preloader.is_idle() {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!     }
//!     preloader.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    core::builder::PreloaderBuilder,
    core::callbacks::Callbacks,
    core::config::PreloadConfig,
    core::scheduler::{Control, Scheduler},
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    probes::ProbeRef,
    request::PreloadRequest,
    subscribers::SubscriberSet,
};

/// One activation: the request it serves and the loop serving it.
struct Run {
    id: u64,
    request: PreloadRequest,
    token: CancellationToken,
    control: mpsc::UnboundedSender<Control>,
    join: JoinHandle<()>,
}

/// Caller-owned preloader instance.
///
/// Callbacks run on the tokio runtime that was current when the preloader was
/// built. They may call back into the preloader (restart or detach); doing so
/// takes effect before any further dispatch or callback of the current run.
pub struct Preloader {
    cfg: PreloadConfig,
    probe: ProbeRef,
    callbacks: Callbacks,
    bus: Bus,
    runtime: Handle,
    root: CancellationToken,
    next_run: AtomicU64,
    current: Mutex<Option<Run>>,
    subs: Mutex<Option<Arc<SubscriberSet>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Preloader {
    /// Starts building a preloader around `probe`.
    pub fn builder(cfg: PreloadConfig, probe: ProbeRef) -> PreloaderBuilder {
        PreloaderBuilder::new(cfg, probe)
    }

    pub(crate) fn new_internal(
        cfg: PreloadConfig,
        probe: ProbeRef,
        callbacks: Callbacks,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        runtime: Handle,
    ) -> Self {
        let root = CancellationToken::new();
        let listener = subscriber_listener(&runtime, &bus, subs.clone(), root.clone());
        Self {
            cfg,
            probe,
            callbacks,
            bus,
            runtime,
            root,
            next_run: AtomicU64::new(1),
            current: Mutex::new(None),
            subs: Mutex::new(Some(subs)),
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Configuration shared by every run.
    pub fn config(&self) -> &PreloadConfig {
        &self.cfg
    }

    /// Event bus; subscribe to observe the preloader without a [`Subscribe`](crate::Subscribe) impl.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Activates the preloader with `request`.
    ///
    /// - No live run, or the live run serves different content: the live run
    ///   (if any) is cancelled silently and a new run starts. Returns `true`.
    /// - The live run serves the same content: nothing happens. Returns `false`.
    pub fn preload(&self, request: impl Into<PreloadRequest>) -> bool {
        let request = request.into();
        let mut current = self.lock_current();

        if let Some(run) = current.as_ref() {
            if run.request == request && !run.token.is_cancelled() {
                debug!(run = run.id, "same request; keeping current run");
                return false;
            }
        }

        if let Some(old) = current.take() {
            old.token.cancel();
            debug!(run = old.id, "restarting with new request");
            self.bus
                .publish(Event::new(EventKind::PreloadRestarted).with_run(old.id));
        }

        if self.root.is_cancelled() {
            warn!("preload requested after shutdown; ignored");
            return false;
        }

        *current = Some(self.start_run(request));
        true
    }

    fn start_run(&self, request: PreloadRequest) -> Run {
        let id = self.next_run.fetch_add(1, Ordering::Relaxed);
        let token = self.root.child_token();

        let mut scheduler = Scheduler::new(
            id,
            &self.cfg,
            self.probe.clone(),
            self.callbacks.clone(),
            self.bus.clone(),
            token.clone(),
        );
        let unique = request.unique_ids();
        if unique.len() != request.len() {
            debug!(run = id, dropped = request.len() - unique.len(), "duplicate identifiers collapsed");
        }
        let count = unique.len();
        scheduler.enqueue_all(unique);
        let control = scheduler.control();

        self.bus.publish(
            Event::new(EventKind::PreloadStarted)
                .with_run(id)
                .with_reason(format!("ids={count}")),
        );
        let join = self.runtime.spawn(scheduler.run());

        Run {
            id,
            request,
            token,
            control,
            join,
        }
    }

    /// Silently drops one identifier from the current run, whether it is still
    /// pending or already in flight. No callback fires for it; the freed slot
    /// goes to the next pending identifier.
    ///
    /// Returns `false` if there is no live run to deliver the request to.
    pub fn cancel(&self, id: &str) -> bool {
        match self.lock_current().as_ref() {
            Some(run) if !run.join.is_finished() => {
                run.control.send(Control::Cancel(Arc::from(id))).is_ok()
            }
            _ => false,
        }
    }

    /// Detaches from the current run: aborts everything in flight and discards
    /// everything pending. No callback fires for any of them.
    ///
    /// Returns `false` if there was no live run. A later [`preload`](Self::preload)
    /// starts from scratch.
    pub fn detach(&self) -> bool {
        match self.lock_current().take() {
            Some(run) => {
                self.cancel_run(&run);
                true
            }
            None => false,
        }
    }

    fn cancel_run(&self, run: &Run) {
        run.token.cancel();
        debug!(run = run.id, "detached");
        self.bus
            .publish(Event::new(EventKind::PreloadDetached).with_run(run.id));
    }

    /// Detaches, waits for the scheduler loop to exit, then stops the event
    /// listener and drains every subscriber queue.
    ///
    /// Once this returns no callback can run anymore.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let run = self.lock_current().take();
        let joined = match run {
            Some(run) => {
                self.cancel_run(&run);
                run.join.await
            }
            None => Ok(()),
        };

        self.root.cancel();
        let listener = lock(&self.listener).take();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
        let subs = lock(&self.subs).take();
        if let Some(set) = subs.and_then(|s| Arc::try_unwrap(s).ok()) {
            set.shutdown().await;
        }

        joined.map_err(RuntimeError::from)
    }

    /// True if there is no run, or the current run reached quiescence.
    pub fn is_idle(&self) -> bool {
        self.lock_current()
            .as_ref()
            .is_none_or(|run| run.join.is_finished())
    }

    /// Request served by the current run, if any.
    pub fn current_request(&self) -> Option<PreloadRequest> {
        self.lock_current().as_ref().map(|run| run.request.clone())
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<Run>> {
        lock(&self.current)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Drop for Preloader {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

/// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
///
/// On root cancellation, events already buffered are still forwarded.
fn subscriber_listener(
    runtime: &Handle,
    bus: &Bus,
    set: Arc<SubscriberSet>,
    root: CancellationToken,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    runtime.spawn(async move {
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(n)) => {
                        warn!(skipped = n, "subscriber listener lagged");
                    }
                    Err(RecvError::Closed) => return,
                },
                _ = root.cancelled() => break,
            }
        }
        while let Ok(ev) = rx.try_recv() {
            set.emit(&ev);
        }
    })
}
