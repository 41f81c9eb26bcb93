//! Session progress counters

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

use crate::events::SessionEvent;

/// Snapshot of a session's counters
///
/// The total is derived from the four counters on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    already_blocked: u64,
    skipped: u64,
    block_success: u64,
    block_fail: u64,
}

impl Progress {
    pub fn already_blocked(&self) -> u64 {
        self.already_blocked
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn block_success(&self) -> u64 {
        self.block_success
    }

    pub fn block_fail(&self) -> u64 {
        self.block_fail
    }

    pub fn total_scraped(&self) -> u64 {
        self.already_blocked + self.skipped + self.block_success + self.block_fail
    }

    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::AlreadyBlocked => self.already_blocked,
            Counter::Skipped => self.skipped,
            Counter::BlockSuccess => self.block_success,
            Counter::BlockFail => self.block_fail,
        }
    }

    fn bump(&mut self, counter: Counter) {
        let slot = match counter {
            Counter::AlreadyBlocked => &mut self.already_blocked,
            Counter::Skipped => &mut self.skipped,
            Counter::BlockSuccess => &mut self.block_success,
            Counter::BlockFail => &mut self.block_fail,
        };
        *slot += 1;
    }
}

impl Serialize for Progress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Progress", 5)?;
        state.serialize_field("alreadyBlocked", &self.already_blocked)?;
        state.serialize_field("skipped", &self.skipped)?;
        state.serialize_field("blockSuccess", &self.block_success)?;
        state.serialize_field("blockFail", &self.block_fail)?;
        state.serialize_field("totalScraped", &self.total_scraped())?;
        state.end()
    }
}

/// Names of the counters a session can increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    AlreadyBlocked,
    Skipped,
    BlockSuccess,
    BlockFail,
}

#[derive(Debug, Default)]
struct TrackerState {
    progress: Progress,
    sealed: bool,
}

/// Shared, increment-only progress record of one session
///
/// Clones share the same counters, so action tasks can report outcomes
/// concurrently. Once sealed, increments are dropped.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    inner: Arc<Mutex<TrackerState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl ProgressTracker {
    pub fn new(events: broadcast::Sender<SessionEvent>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TrackerState::default())),
            events,
        }
    }

    fn state(&self) -> MutexGuard<'_, TrackerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add one to a counter and publish the new snapshot
    ///
    /// Returns the published snapshot, or `None` when the tracker is sealed.
    pub fn increment(&self, counter: Counter) -> Option<Progress> {
        let mut state = self.state();
        if state.sealed {
            return None;
        }
        state.progress.bump(counter);
        let snapshot = state.progress;
        // published under the lock so subscribers see snapshots in order
        let _ = self.events.send(SessionEvent::ProgressChanged(snapshot));
        Some(snapshot)
    }

    /// Stop accepting increments
    pub fn seal(&self) {
        self.state().sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.state().sealed
    }

    pub fn snapshot(&self) -> Progress {
        self.state().progress
    }
}
