//! # Run a single probe attempt.
//!
//! Executes one attempt of a [`Probe`] against one identifier with a deadline,
//! and publishes the attempt's outcome to the [`Bus`].
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   probe() → Ok(())            → publish ProbeSucceeded
//!
//! Failure:
//!   probe() → Err(Failed/Fatal) → publish ProbeFailed
//!
//! Timeout:
//!   deadline elapsed → drop probe future, cancel child → publish TimeoutHit
//!                                                     → publish ProbeFailed
//!                                                     → return Timeout error
//!
//! Parent cancelled (restart / detach):
//!   anything → return Canceled, publish nothing
//! ```
//!
//! ## Rules
//! - Timeout races the probe; whichever completes first wins and the other is dropped
//! - Derives a **child token** per attempt; it is cancelled when the attempt ends
//!   for any reason (including the enclosing task being aborted)
//! - Child cancellation does **not** affect the parent

use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    core::task::Task,
    error::ProbeError,
    events::{Bus, Event, EventKind},
    probes::Probe,
};

/// Executes one attempt of `task` through `probe`, publishing the attempt's outcome to `bus`.
///
/// Returns [`ProbeError::Canceled`] without publishing when `parent` was
/// cancelled while the attempt ran; the caller must treat that as silent.
pub(crate) async fn run_once<P: Probe + ?Sized>(
    probe: &P,
    task: &Task,
    parent: &CancellationToken,
    timeout: Duration,
    run: u64,
    bus: &Bus,
) -> Result<(), ProbeError> {
    let child = parent.child_token();
    let _abort_on_exit = child.clone().drop_guard();

    let res = match time::timeout(timeout, probe.probe(task.id.clone(), child.clone())).await {
        Ok(r) => r,
        Err(_elapsed) => {
            child.cancel();
            if !parent.is_cancelled() {
                publish_timeout(bus, task, timeout, run);
            }
            Err(ProbeError::Timeout { timeout })
        }
    };

    if parent.is_cancelled() {
        return Err(ProbeError::Canceled);
    }

    match res {
        Ok(()) => {
            bus.publish(
                Event::new(EventKind::ProbeSucceeded)
                    .with_id(task.id.clone())
                    .with_attempt(task.attempt)
                    .with_run(run),
            );
            Ok(())
        }
        Err(e) => {
            bus.publish(
                Event::new(EventKind::ProbeFailed)
                    .with_id(task.id.clone())
                    .with_attempt(task.attempt)
                    .with_reason(e.to_string())
                    .with_run(run),
            );
            Err(e)
        }
    }
}

/// Publishes `TimeoutHit` event (always followed by `ProbeFailed`).
fn publish_timeout(bus: &Bus, task: &Task, dur: Duration, run: u64) {
    bus.publish(
        Event::new(EventKind::TimeoutHit)
            .with_id(task.id.clone())
            .with_timeout(dur)
            .with_attempt(task.attempt)
            .with_run(run),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;

    use crate::probes::ProbeFn;

    fn task(id: &str) -> Task {
        Task::new(Arc::from(id))
    }

    #[tokio::test(start_paused = true)]
    async fn success_publishes_probe_succeeded() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let probe = ProbeFn::new("ok", |_id: Arc<str>, _ctx: CancellationToken| async {
            Ok::<(), ProbeError>(())
        });

        let parent = CancellationToken::new();
        let res = run_once(&probe, &task("a"), &parent, Duration::from_secs(1), 0, &bus).await;

        assert!(res.is_ok());
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::ProbeSucceeded);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_cancels_child_and_reports_timeout() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let seen: Arc<Mutex<Option<CancellationToken>>> = Arc::new(Mutex::new(None));
        let slot = seen.clone();
        let probe = ProbeFn::new("hang", move |_id: Arc<str>, ctx: CancellationToken| {
            *slot.lock().unwrap() = Some(ctx);
            std::future::pending::<Result<(), ProbeError>>()
        });

        let started = time::Instant::now();
        let res = run_once(
            &probe,
            &task("slow"),
            &CancellationToken::new(),
            Duration::from_millis(100),
            0,
            &bus,
        )
        .await;

        assert_eq!(
            res,
            Err(ProbeError::Timeout {
                timeout: Duration::from_millis(100)
            })
        );
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::TimeoutHit);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::ProbeFailed);

        let ctx = seen.lock().unwrap().take().unwrap();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_is_silent() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let parent = CancellationToken::new();
        parent.cancel();
        let probe = ProbeFn::new("err", |_id: Arc<str>, _ctx: CancellationToken| async {
            Err(ProbeError::failed("late"))
        });

        let res = run_once(&probe, &task("a"), &parent, Duration::from_secs(1), 0, &bus).await;

        assert_eq!(res, Err(ProbeError::Canceled));
        assert!(rx.try_recv().is_err());
    }
}
