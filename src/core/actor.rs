//! # ProbeActor: drives one identifier to a terminal outcome.
//!
//! Owns one [`Task`] from dispatch until it succeeds, permanently fails, or is
//! aborted:
//! - per-attempt deadline via [`run_once`],
//! - retries per [`RetryPolicy`],
//! - delays per [`BackoffPolicy`],
//! - cooperative cancellation via [`CancellationToken`].
//!
//! ## State machine
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!        Loading ──► run_once() ──► Ok ─────────────► Succeeded ──► Report::Finished(Ready)
//!            │                                              │
//!            │            Err(e) + allows_another ──► Retrying ──► sleep(backoff.next(attempt))
//!            │                                         │           └─► attempt += 1 ──┘
//!            │                                         └─► Report::Retrying
//!            │
//!            └─► Err(e) + budget spent / fatal ──► Failed ──► Report::Finished(Failed(reason))
//!
//! token cancelled at any point ──► exit, report nothing
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially** within one actor, and the actor keeps its
//!   scheduler slot across retries (it never goes back to the pending queue)
//! - The actor never touches the scheduler's queue or active set; it only
//!   sends [`Report`]s upward
//! - At most one `Report::Finished` per actor, never after cancellation

use std::sync::Arc;
use std::time::Duration;

use tokio::{select, sync::mpsc, time};
use tokio_util::sync::CancellationToken;

use crate::{
    core::runner::run_once,
    core::task::{Task, TaskKey},
    error::ProbeError,
    events::{Bus, Event, EventKind},
    outcome::Outcome,
    policies::{BackoffPolicy, RetryPolicy},
    probes::ProbeRef,
};

/// Message from a probe actor to the scheduler loop.
#[derive(Debug)]
pub(crate) enum Report {
    /// A retryable attempt failed and the next one is scheduled after `delay`.
    Retrying {
        key: TaskKey,
        id: Arc<str>,
        attempt: u32,
        delay: Duration,
    },
    /// The task reached a terminal outcome.
    Finished {
        key: TaskKey,
        id: Arc<str>,
        attempt: u32,
        outcome: Outcome,
    },
}

impl Report {
    pub fn key(&self) -> TaskKey {
        match self {
            Report::Retrying { key, .. } | Report::Finished { key, .. } => *key,
        }
    }

    pub fn id(&self) -> &Arc<str> {
        match self {
            Report::Retrying { id, .. } | Report::Finished { id, .. } => id,
        }
    }
}

/// Parameters copied from [`PreloadConfig`](crate::PreloadConfig) for each actor.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ProbeActorParams {
    /// Per-attempt deadline.
    pub timeout: Duration,
    /// How many attempts the task gets.
    pub retry: RetryPolicy,
    /// How to compute retry delays.
    pub backoff: BackoffPolicy,
}

/// Drives a single [`Task`] through its attempts and reports the result upward.
pub(crate) struct ProbeActor {
    key: TaskKey,
    task: Task,
    probe: ProbeRef,
    params: ProbeActorParams,
    bus: Bus,
    reports: mpsc::UnboundedSender<Report>,
}

impl ProbeActor {
    pub fn new(
        key: TaskKey,
        task: Task,
        probe: ProbeRef,
        params: ProbeActorParams,
        bus: Bus,
        reports: mpsc::UnboundedSender<Report>,
    ) -> Self {
        Self {
            key,
            task,
            probe,
            params,
            bus,
            reports,
        }
    }

    /// Runs the actor until a terminal outcome or cancellation.
    ///
    /// ### Cancellation semantics
    /// `token` is checked before every attempt, raced against every attempt
    /// (through the attempt's child token) and against every backoff sleep. A
    /// retry timer that fires after the task was aborted therefore cannot start
    /// another attempt.
    pub async fn run(mut self, token: CancellationToken) {
        loop {
            if token.is_cancelled() {
                return;
            }

            self.bus.publish(
                Event::new(EventKind::ProbeStarting)
                    .with_id(self.task.id.clone())
                    .with_attempt(self.task.attempt)
                    .with_run(self.key.run),
            );

            let res = run_once(
                self.probe.as_ref(),
                &self.task,
                &token,
                self.params.timeout,
                self.key.run,
                &self.bus,
            )
            .await;

            let err = match res {
                Ok(()) => {
                    self.finish(&token, Outcome::Ready);
                    return;
                }
                Err(ProbeError::Canceled) if token.is_cancelled() => return,
                Err(e) => e,
            };

            if !self.params.retry.allows_another(self.task.attempt, &err) {
                self.finish(&token, Outcome::Failed(err.fail_reason()));
                return;
            }

            let delay = self.params.backoff.next(self.task.attempt);
            self.bus.publish(
                Event::new(EventKind::BackoffScheduled)
                    .with_id(self.task.id.clone())
                    .with_attempt(self.task.attempt)
                    .with_delay(delay)
                    .with_reason(err.to_string())
                    .with_run(self.key.run),
            );
            let _ = self.reports.send(Report::Retrying {
                key: self.key,
                id: self.task.id.clone(),
                attempt: self.task.attempt,
                delay,
            });

            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => return,
            }

            self.task.attempt += 1;
        }
    }

    fn finish(&self, token: &CancellationToken, outcome: Outcome) {
        if token.is_cancelled() {
            return;
        }
        let _ = self.reports.send(Report::Finished {
            key: self.key,
            id: self.task.id.clone(),
            attempt: self.task.attempt,
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::outcome::FailReason;
    use crate::policies::JitterPolicy;
    use crate::probes::ProbeFn;

    fn params(timeout_ms: u64) -> ProbeActorParams {
        ProbeActorParams {
            timeout: Duration::from_millis(timeout_ms),
            retry: RetryPolicy::default(),
            backoff: BackoffPolicy {
                unit: Duration::from_millis(2000),
                max: Duration::from_secs(30),
                jitter: JitterPolicy::None,
            },
        }
    }

    fn key() -> TaskKey {
        TaskKey { run: 1, seq: 0 }
    }

    fn counting_probe(
        calls: Arc<AtomicU32>,
        fail_first: u32,
    ) -> ProbeRef {
        ProbeFn::arc("counting", move |_id: Arc<str>, _ctx: CancellationToken| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n <= fail_first {
                    Err(ProbeError::failed(format!("boom #{n}")))
                } else {
                    Ok(())
                }
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_on_second_attempt_after_one_backoff_unit() {
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let actor = ProbeActor::new(
            key(),
            Task::new(Arc::from("flaky")),
            counting_probe(calls.clone(), 1),
            params(1000),
            Bus::new(16),
            tx,
        );

        let started = time::Instant::now();
        actor.run(CancellationToken::new()).await;

        match rx.recv().await.unwrap() {
            Report::Retrying { attempt, delay, .. } => {
                assert_eq!(attempt, 1);
                assert_eq!(delay, Duration::from_millis(2000));
            }
            other => panic!("unexpected report {other:?}"),
        }
        match rx.recv().await.unwrap() {
            Report::Finished { attempt, outcome, .. } => {
                assert_eq!(attempt, 2);
                assert_eq!(outcome, Outcome::Ready);
            }
            other => panic!("unexpected report {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_two_attempts_with_error_reason() {
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let actor = ProbeActor::new(
            key(),
            Task::new(Arc::from("bad")),
            counting_probe(calls.clone(), u32::MAX),
            params(1000),
            Bus::new(16),
            tx,
        );

        actor.run(CancellationToken::new()).await;

        assert!(matches!(rx.recv().await, Some(Report::Retrying { .. })));
        match rx.recv().await.unwrap() {
            Report::Finished { outcome, .. } => {
                assert_eq!(outcome, Outcome::Failed(FailReason::Error));
            }
            other => panic!("unexpected report {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_backoff_reports_nothing_more() {
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let actor = ProbeActor::new(
            key(),
            Task::new(Arc::from("bad")),
            counting_probe(calls.clone(), u32::MAX),
            params(1000),
            Bus::new(16),
            tx,
        );
        let token = CancellationToken::new();
        let handle = tokio::spawn(actor.run(token.clone()));

        assert!(matches!(rx.recv().await, Some(Report::Retrying { .. })));
        token.cancel();
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(rx.recv().await.is_none());
    }
}
