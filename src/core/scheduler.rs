//! # Scheduler: pending queue, active set and the pump.
//!
//! One [`Scheduler`] exists per run (one [`PreloadRequest`](crate::PreloadRequest)
//! activation). It runs as a single loop task that exclusively owns the
//! pending queue and the [`AbortRegistry`]; probe actors only talk to it through
//! [`Report`] messages, so none of the bookkeeping needs a lock.
//!
//! ## Loop
//! ```text
//! enqueue_all(ids) ──► run():
//!   pump()
//!   loop {
//!     ├─► pending empty && active empty ──► publish Quiescent, exit
//!     └─► select (biased) {
//!           token cancelled      ──► teardown(): abort_all, clear pending, exit
//!           Control::Cancel(id)  ──► drop id from pending / abort it, pump()
//!           Report::Retrying     ──► (stale? ignore) pump()
//!           Report::Finished     ──► (stale? ignore) take slot, notify caller, pump()
//!         }
//!   }
//!
//! pump():
//!   while |active| < max_concurrent && pending non-empty:
//!     pop head → spawn ProbeActor(child token) → register in active set
//! ```
//!
//! ## Rules
//! - `|active| <= max_concurrent` at every instant, including while a caller
//!   callback runs (callbacks run on the loop, between pumps)
//! - An identifier is dispatched at most once per run
//! - Nothing is dispatched and no callback fires once the run token is cancelled,
//!   including when a callback itself cancels it (restart/detach from inside `on_ready`)

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::{select, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    core::actor::{ProbeActor, ProbeActorParams, Report},
    core::callbacks::Callbacks,
    core::config::PreloadConfig,
    core::registry::AbortRegistry,
    core::task::{Task, TaskKey},
    events::{Bus, Event, EventKind},
    outcome::Outcome,
    probes::ProbeRef,
};

/// Request from the preloader to a running scheduler loop.
#[derive(Debug)]
pub(crate) enum Control {
    /// Silently drop one identifier, pending or in flight.
    Cancel(Arc<str>),
}

/// Single-run scheduler owning the pending queue and active set.
pub(crate) struct Scheduler {
    run: u64,
    max_concurrent: usize,
    params: ProbeActorParams,
    probe: ProbeRef,
    callbacks: Callbacks,
    bus: Bus,
    token: CancellationToken,

    pending: VecDeque<Task>,
    active: AbortRegistry,
    next_seq: u64,

    reports_tx: mpsc::UnboundedSender<Report>,
    reports_rx: mpsc::UnboundedReceiver<Report>,
    control_tx: mpsc::UnboundedSender<Control>,
    control_rx: mpsc::UnboundedReceiver<Control>,
}

impl Scheduler {
    pub fn new(
        run: u64,
        cfg: &PreloadConfig,
        probe: ProbeRef,
        callbacks: Callbacks,
        bus: Bus,
        token: CancellationToken,
    ) -> Self {
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        Self {
            run,
            max_concurrent: cfg.max_concurrent.max(1),
            params: ProbeActorParams {
                timeout: cfg.timeout,
                retry: cfg.retry,
                backoff: cfg.backoff,
            },
            probe,
            callbacks,
            bus,
            token,
            pending: VecDeque::new(),
            active: AbortRegistry::new(),
            next_seq: 0,
            reports_tx,
            reports_rx,
            control_tx,
            control_rx,
        }
    }

    /// Sender for [`Control`] requests; valid until the loop exits.
    pub fn control(&self) -> mpsc::UnboundedSender<Control> {
        self.control_tx.clone()
    }

    /// Replaces the pending queue with attempt-1 tasks for `ids`, in order.
    ///
    /// Does not touch the active set.
    pub fn enqueue_all(&mut self, ids: impl IntoIterator<Item = Arc<str>>) {
        self.pending = ids.into_iter().map(Task::new).collect();
    }

    fn is_quiescent(&self) -> bool {
        self.pending.is_empty() && self.active.is_empty()
    }

    /// Dispatches pending tasks while there is capacity. Idempotent.
    pub fn pump(&mut self) {
        while !self.token.is_cancelled() && self.active.len() < self.max_concurrent {
            let Some(task) = self.pending.pop_front() else {
                break;
            };
            self.dispatch(task);
        }
    }

    fn dispatch(&mut self, task: Task) {
        if self.active.contains(&task.id) {
            warn!(id = %task.id, "identifier already in flight; dispatch dropped");
            return;
        }
        let key = TaskKey {
            run: self.run,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        let id = task.id.clone();
        let token = self.token.child_token();
        let actor = ProbeActor::new(
            key,
            task,
            self.probe.clone(),
            self.params,
            self.bus.clone(),
            self.reports_tx.clone(),
        );
        let join = tokio::spawn(actor.run(token.clone()));

        if self.active.insert(id.clone(), key, token, join) {
            debug!(id = %id, %key, probe = self.probe.name(), active = self.active.len(), "dispatched");
        }
    }

    /// Drives the run until quiescence or cancellation.
    pub async fn run(mut self) {
        let token = self.token.clone();
        self.pump();

        loop {
            if self.is_quiescent() {
                debug!(run = self.run, "quiescent");
                self.bus
                    .publish(Event::new(EventKind::Quiescent).with_run(self.run));
                return;
            }

            select! {
                biased;
                _ = token.cancelled() => {
                    self.teardown();
                    return;
                }
                Some(ctrl) = self.control_rx.recv() => self.control_request(ctrl),
                report = self.reports_rx.recv() => match report {
                    Some(report) => self.handle(report),
                    None => return,
                },
            }
        }
    }

    fn handle(&mut self, report: Report) {
        let key = report.key();
        if !self.active.is_current(report.id(), key) {
            debug!(id = %report.id(), %key, "stale report ignored");
            return;
        }

        match report {
            Report::Retrying { id, attempt, delay, .. } => {
                debug!(id = %id, attempt, ?delay, "retry scheduled");
                self.pump();
            }
            Report::Finished {
                id,
                attempt,
                outcome,
                ..
            } => {
                self.active.take_if_current(&id, key);
                self.notify(&id, attempt, outcome);
                self.pump();
            }
        }
    }

    fn control_request(&mut self, ctrl: Control) {
        match ctrl {
            Control::Cancel(id) => {
                let before = self.pending.len();
                self.pending.retain(|t| t.id != id);
                let dropped = before != self.pending.len();
                let aborted = self.active.abort(&id);
                debug!(id = %id, dropped, aborted, "identifier cancelled");
                if aborted {
                    self.bus.publish(
                        Event::new(EventKind::ProbeCancelled)
                            .with_id(id)
                            .with_run(self.run),
                    );
                }
                self.pump();
            }
        }
    }

    /// Publishes the terminal event and invokes exactly one caller callback.
    fn notify(&self, id: &Arc<str>, attempt: u32, outcome: Outcome) {
        if self.token.is_cancelled() {
            return;
        }

        let res = match outcome {
            Outcome::Ready => {
                self.bus.publish(
                    Event::new(EventKind::ResourceReady)
                        .with_id(id.clone())
                        .with_attempt(attempt)
                        .with_run(self.run),
                );
                self.callbacks.ready(id)
            }
            Outcome::Failed(reason) => {
                self.bus.publish(
                    Event::new(EventKind::ResourceFailed)
                        .with_id(id.clone())
                        .with_attempt(attempt)
                        .with_reason(reason.as_str())
                        .with_run(self.run),
                );
                self.callbacks.fail(id, reason)
            }
        };

        if let Err(info) = res {
            warn!(id = %id, panic = %info, "preload callback panicked");
            self.bus.publish(
                Event::new(EventKind::CallbackPanicked)
                    .with_id(id.clone())
                    .with_reason(info)
                    .with_run(self.run),
            );
        }
    }

    /// Aborts everything in flight and discards the pending queue. Silent for the caller.
    fn teardown(&mut self) {
        let dropped = self.pending.len();
        self.pending.clear();
        let aborted = self.active.abort_all();
        debug!(run = self.run, aborted = aborted.len(), dropped, "run torn down");

        for id in aborted {
            self.bus.publish(
                Event::new(EventKind::ProbeCancelled)
                    .with_id(id)
                    .with_run(self.run),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::error::ProbeError;
    use crate::probes::ProbeFn;

    fn ids(list: &[&str]) -> Vec<Arc<str>> {
        list.iter().map(|s| Arc::from(*s)).collect()
    }

    fn never_resolving() -> ProbeRef {
        ProbeFn::arc("pending", |_id: Arc<str>, _ctx: CancellationToken| {
            std::future::pending::<Result<(), ProbeError>>()
        })
    }

    fn scheduler(max_concurrent: usize, probe: ProbeRef, callbacks: Callbacks) -> Scheduler {
        let cfg = PreloadConfig::default().with_max_concurrent(max_concurrent);
        Scheduler::new(1, &cfg, probe, callbacks, Bus::new(64), CancellationToken::new())
    }

    #[tokio::test(start_paused = true)]
    async fn pump_respects_bound_and_is_idempotent() {
        let mut s = scheduler(2, never_resolving(), Callbacks::new());
        s.enqueue_all(ids(&["v1", "v2", "v3", "v4"]));

        s.pump();
        assert_eq!(s.active.len(), 2);
        assert_eq!(s.pending.len(), 2);
        assert_eq!(s.active.ids(), ids(&["v1", "v2"]));

        s.pump();
        assert_eq!(s.active.len(), 2);
        assert_eq!(s.pending.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_all_replaces_pending_only() {
        let mut s = scheduler(1, never_resolving(), Callbacks::new());
        s.enqueue_all(ids(&["a", "b"]));
        s.pump();
        s.enqueue_all(ids(&["x", "y", "z"]));

        assert_eq!(s.active.ids(), ids(&["a"]));
        assert_eq!(s.pending.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_finished_report_is_ignored() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = seen.clone();
        let callbacks = Callbacks::new().on_ready(move |id| sink.lock().unwrap().push(id.to_string()));
        let mut s = scheduler(1, never_resolving(), callbacks);
        s.enqueue_all(ids(&["a"]));
        s.pump();

        s.handle(Report::Finished {
            key: TaskKey { run: 1, seq: 99 },
            id: Arc::from("a"),
            attempt: 1,
            outcome: Outcome::Ready,
        });

        assert!(seen.lock().unwrap().is_empty());
        assert!(s.active.contains("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn targeted_cancel_frees_slot_or_drops_pending() {
        let mut s = scheduler(1, never_resolving(), Callbacks::new());
        s.enqueue_all(ids(&["a", "b", "c"]));
        s.pump();

        s.control_request(Control::Cancel(Arc::from("a")));
        assert_eq!(s.active.ids(), ids(&["b"]));
        assert_eq!(s.pending.len(), 1);

        s.control_request(Control::Cancel(Arc::from("c")));
        assert_eq!(s.active.ids(), ids(&["b"]));
        assert!(s.pending.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_is_silent_and_clears_everything() {
        let fired = Arc::new(Mutex::new(0u32));
        let f = fired.clone();
        let callbacks = Callbacks::new()
            .on_ready({
                let f = fired.clone();
                move |_| *f.lock().unwrap() += 1
            })
            .on_fail(move |_, _| *f.lock().unwrap() += 1);
        let token = CancellationToken::new();
        let cfg = PreloadConfig::default()
            .with_max_concurrent(2)
            .with_timeout(Duration::from_millis(100));
        let mut s = Scheduler::new(1, &cfg, never_resolving(), callbacks, Bus::new(64), token.clone());
        s.enqueue_all(ids(&["a", "b", "c"]));

        let handle = tokio::spawn(s.run());
        tokio::task::yield_now().await;
        token.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(*fired.lock().unwrap(), 0);
    }
}
