#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use preloadvisor::{
    Callbacks, FailReason, PreloadConfig, Preloader, ProbeError, ProbeFn, ProbeRef,
};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Routes crate diagnostics to the test output; `RUST_LOG=preloadvisor=debug` to see them.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// What the scripted probe does for one identifier.
#[derive(Clone, Copy, Debug)]
pub enum Behavior {
    Ready(u64),
    Error(u64),
    Hang,
}

/// Probe driven by a per-identifier script, recording starts and concurrency.
pub struct Script {
    t0: Instant,
    behaviors: HashMap<String, Behavior>,
    fallback: Behavior,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    starts: Mutex<Vec<(String, Duration)>>,
}

struct InFlight(Arc<Script>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Script {
    pub fn new(fallback: Behavior) -> Self {
        Self {
            t0: Instant::now(),
            behaviors: HashMap::new(),
            fallback,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            starts: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, id: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(id.to_string(), behavior);
        self
    }

    pub fn into_probe(self) -> (Arc<Script>, ProbeRef) {
        let script = Arc::new(self);
        let s = script.clone();
        let probe: ProbeRef = ProbeFn::arc("script", move |id: Arc<str>, _ctx: CancellationToken| {
            let now = s.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            s.peak.fetch_max(now, Ordering::SeqCst);
            s.starts
                .lock()
                .unwrap()
                .push((id.to_string(), s.t0.elapsed()));
            let guard = InFlight(s.clone());
            let behavior = s.behaviors.get(&*id).copied().unwrap_or(s.fallback);
            async move {
                let _guard = guard;
                match behavior {
                    Behavior::Ready(ms) => {
                        time::sleep(Duration::from_millis(ms)).await;
                        Ok(())
                    }
                    Behavior::Error(ms) => {
                        time::sleep(Duration::from_millis(ms)).await;
                        Err(ProbeError::failed("scripted failure"))
                    }
                    Behavior::Hang => std::future::pending::<Result<(), ProbeError>>().await,
                }
            }
        });
        (script, probe)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Attempt start order.
    pub fn start_order(&self) -> Vec<String> {
        self.starts.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    /// Start offsets of every attempt for `id`.
    pub fn starts_of(&self, id: &str) -> Vec<Duration> {
        self.starts
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == id)
            .map(|(_, at)| *at)
            .collect()
    }
}

/// One caller notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub outcome: &'static str,
    pub at: Duration,
}

/// Collects every `on_ready` / `on_fail` invocation.
#[derive(Clone)]
pub struct Recorder {
    t0: Instant,
    notes: Arc<Mutex<Vec<Note>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            t0: Instant::now(),
            notes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn record(&self, id: &str, outcome: &'static str) {
        self.notes.lock().unwrap().push(Note {
            id: id.to_string(),
            outcome,
            at: self.t0.elapsed(),
        });
    }

    pub fn callbacks(&self) -> Callbacks {
        let ready = self.clone();
        let fail = self.clone();
        Callbacks::new()
            .on_ready(move |id| ready.record(id, "ready"))
            .on_fail(move |id, reason: FailReason| fail.record(id, reason.as_str()))
    }

    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }

    /// `(id, outcome)` pairs sorted by id.
    pub fn outcomes(&self) -> Vec<(String, &'static str)> {
        let mut v: Vec<_> = self
            .notes()
            .into_iter()
            .map(|n| (n.id, n.outcome))
            .collect();
        v.sort();
        v
    }

    pub fn count_for(&self, id: &str) -> usize {
        self.notes().iter().filter(|n| n.id == id).count()
    }
}

pub fn config(max_concurrent: usize, timeout_ms: u64) -> PreloadConfig {
    PreloadConfig::default()
        .with_max_concurrent(max_concurrent)
        .with_timeout(Duration::from_millis(timeout_ms))
}

/// Advances the (paused) clock until the current run is quiescent.
pub async fn wait_idle(p: &Preloader) {
    while !p.is_idle() {
        time::sleep(Duration::from_millis(10)).await;
    }
}
