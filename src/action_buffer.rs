//! Bounded set of in-flight block actions
//!
//! Actions are spawned as tokio tasks as soon as a member is classified. The
//! buffer holds at most `capacity` of them; once full, the owner drains it
//! (waits for every task) before pulling more members, which bounds the
//! number of outstanding upstream requests per session.

use futures::future::join_all;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default number of actions allowed in flight per session
pub const DEFAULT_CAPACITY: usize = 150;

#[derive(Debug)]
pub struct ActionBuffer {
    capacity: usize,
    pending: Vec<JoinHandle<()>>,
    drains: usize,
}

impl ActionBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            pending: Vec::with_capacity(capacity),
            drains: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.pending.len() >= self.capacity
    }

    /// Number of drains that actually waited on pending actions
    pub fn drain_count(&self) -> usize {
        self.drains
    }

    /// Start an action and track it
    ///
    /// Returns `true` when the buffer is full and must be drained before the
    /// next spawn.
    pub fn spawn<F>(&mut self, action: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        debug_assert!(!self.is_full(), "spawn on a full action buffer");
        self.pending.push(tokio::spawn(action));
        self.is_full()
    }

    /// Wait for every pending action, then clear the buffer
    ///
    /// If this future is dropped before it finishes, the remaining actions
    /// are detached rather than cancelled.
    pub async fn drain(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        debug!("Draining {} pending actions", count);

        for result in join_all(pending).await {
            if let Err(e) = result {
                warn!("Action task failed to complete: {}", e);
            }
        }

        self.drains += 1;
        debug!("Drained {} actions (drain #{})", count, self.drains);
    }

    /// Forget pending actions without waiting for them
    ///
    /// The tasks keep running; their handles are dropped. Returns how many
    /// were abandoned.
    pub fn discard(&mut self) -> usize {
        let abandoned = self.pending.len();
        self.pending.clear();
        if abandoned > 0 {
            debug!("Abandoned {} pending actions", abandoned);
        }
        abandoned
    }
}

impl Default for ActionBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
