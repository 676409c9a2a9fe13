//! Transient per-identifier work record.

use std::fmt;
use std::sync::Arc;

/// Identity of one dispatch of an identifier within one run.
///
/// The abort registry stores the key next to the cancellation handle; a report
/// carrying a key that is no longer registered comes from an aborted dispatch
/// and is ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TaskKey {
    pub run: u64,
    pub seq: u64,
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.run, self.seq)
    }
}

/// `{ id, attempt }` owned by the scheduler while queued and by one probe actor
/// while in flight.
#[derive(Clone, Debug)]
pub(crate) struct Task {
    pub id: Arc<str>,
    pub attempt: u32,
}

impl Task {
    pub fn new(id: Arc<str>) -> Self {
        Self { id, attempt: 1 }
    }
}
