//! # Abort registry: one cancellation handle per in-flight identifier.
//!
//! The registry is the scheduler's **active set**: an identifier is active iff
//! it has an entry here, so `len()` is `|ActiveSet|` and the "entry exists iff
//! active" invariant holds by construction.
//!
//! ## Architecture
//! ```text
//! Scheduler.pump()        ──► insert(id, key, token, join)
//! Report::Finished(key)   ──► take_if_current(id, key) ──► Some(entry) → callback
//!                                                       └► None        → stale, ignored
//! restart / detach        ──► abort_all()  → cancel + abort every entry
//! ```
//!
//! ## Rules
//! - Owned by the scheduler loop only; no locking
//! - Each entry remembers the [`TaskKey`] of the dispatch that created it, so a
//!   report from an aborted dispatch can never remove or resolve a newer one
//! - Aborting both cancels the token (cooperative) and aborts the join handle
//!   (drops the probe future at its next suspension point)

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::task::TaskKey;

/// Handle to a running probe actor.
struct Entry {
    /// Dispatch that owns this slot.
    key: TaskKey,
    /// Individual cancellation token for this identifier.
    cancel: CancellationToken,
    /// Join handle for the actor's execution.
    join: JoinHandle<()>,
}

impl Entry {
    fn abort(self) {
        self.cancel.cancel();
        self.join.abort();
    }
}

/// Registry of in-flight identifiers keyed by id.
#[derive(Default)]
pub(crate) struct AbortRegistry {
    entries: HashMap<Arc<str>, Entry>,
}

impl AbortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identifiers in flight.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// True if `key` is the dispatch currently registered for `id`.
    pub fn is_current(&self, id: &str, key: TaskKey) -> bool {
        self.entries.get(id).is_some_and(|e| e.key == key)
    }

    /// Registers a freshly spawned actor.
    ///
    /// Returns `false` (and aborts the newcomer) if `id` is already in flight;
    /// the scheduler never dispatches an identifier twice.
    pub fn insert(
        &mut self,
        id: Arc<str>,
        key: TaskKey,
        cancel: CancellationToken,
        join: JoinHandle<()>,
    ) -> bool {
        if self.entries.contains_key(&id) {
            Entry { key, cancel, join }.abort();
            return false;
        }
        self.entries.insert(id, Entry { key, cancel, join });
        true
    }

    /// Removes the entry for `id` if it belongs to `key`.
    ///
    /// The actor is already finishing when this is called, so its join handle
    /// is dropped (detached) rather than awaited.
    pub fn take_if_current(&mut self, id: &str, key: TaskKey) -> bool {
        if !self.is_current(id, key) {
            return false;
        }
        self.entries.remove(id).is_some()
    }

    /// Aborts one identifier. Returns `false` if it was not in flight.
    pub fn abort(&mut self, id: &str) -> bool {
        match self.entries.remove(id) {
            Some(entry) => {
                entry.abort();
                true
            }
            None => false,
        }
    }

    /// Aborts every identifier and returns their ids, sorted.
    pub fn abort_all(&mut self) -> Vec<Arc<str>> {
        let mut ids = Vec::with_capacity(self.entries.len());
        for (id, entry) in self.entries.drain() {
            entry.abort();
            ids.push(id);
        }
        ids.sort_unstable();
        ids
    }

    /// Sorted list of identifiers in flight.
    #[cfg(test)]
    pub fn ids(&self) -> Vec<Arc<str>> {
        let mut ids: Vec<Arc<str>> = self.entries.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }
}

impl Drop for AbortRegistry {
    fn drop(&mut self) {
        self.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seq: u64) -> TaskKey {
        TaskKey { run: 1, seq }
    }

    fn pending_actor(token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { token.cancelled().await })
    }

    #[tokio::test]
    async fn stale_key_cannot_take_entry() {
        let mut reg = AbortRegistry::new();
        let token = CancellationToken::new();
        assert!(reg.insert(Arc::from("a"), key(2), token.clone(), pending_actor(token)));

        assert!(!reg.take_if_current("a", key(1)));
        assert!(reg.contains("a"));
        assert!(reg.take_if_current("a", key(2)));
        assert!(reg.is_empty());
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected_and_aborted() {
        let mut reg = AbortRegistry::new();
        let first = CancellationToken::new();
        let second = CancellationToken::new();
        assert!(reg.insert(Arc::from("a"), key(1), first.clone(), pending_actor(first.clone())));
        assert!(!reg.insert(Arc::from("a"), key(2), second.clone(), pending_actor(second.clone())));

        assert!(second.is_cancelled());
        assert!(!first.is_cancelled());
        assert!(reg.is_current("a", key(1)));
    }

    #[tokio::test]
    async fn abort_all_cancels_everything() {
        let mut reg = AbortRegistry::new();
        let tokens: Vec<CancellationToken> = (0..3).map(|_| CancellationToken::new()).collect();
        for (i, (id, t)) in ["c", "a", "b"].iter().zip(&tokens).enumerate() {
            reg.insert(Arc::from(*id), key(i as u64), t.clone(), pending_actor(t.clone()));
        }

        let ids = reg.abort_all();

        assert_eq!(ids.iter().map(|s| &**s).collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(tokens.iter().all(CancellationToken::is_cancelled));
        assert_eq!(reg.len(), 0);
    }

    #[tokio::test]
    async fn targeted_abort_leaves_others_running() {
        let mut reg = AbortRegistry::new();
        let a = CancellationToken::new();
        let b = CancellationToken::new();
        reg.insert(Arc::from("a"), key(1), a.clone(), pending_actor(a.clone()));
        reg.insert(Arc::from("b"), key(2), b.clone(), pending_actor(b.clone()));

        assert!(reg.abort("a"));
        assert!(!reg.abort("a"));

        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
        assert_eq!(reg.ids().len(), 1);
    }
}
