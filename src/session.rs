//! Chain block session: walks a target's list and blocks its members
//!
//! # Lifecycle
//!
//! ```text
//! Initial ──start()──> Running <──> RateLimited
//!    │                    │              │
//!    └────stop()──────────┴──────────────┴──> Stopped
//!                         ├── list exhausted ──> Completed
//!                         └── fatal error ─────> Error
//! ```
//!
//! Completed, Stopped and Error are terminal. All state changes go through
//! the session's own methods and are published as [`SessionEvent`]s.

use chrono::Utc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::action_buffer::{ActionBuffer, DEFAULT_CAPACITY};
use crate::classifier::{classify, Decision};
use crate::client::ChainBlockClient;
use crate::config::Config;
use crate::error::{ChainBlockError, Result};
use crate::events::{SessionEvent, SessionStatus};
use crate::models::{FollowKind, SessionOptions, TwitterUser};
use crate::pagination::{walk_members, PageItem};
use crate::progress::{Counter, Progress, ProgressTracker};
use crate::rate_limit::{Limit, RateLimitCoordinator};

const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// What a session is constructed from
#[derive(Debug, Clone)]
pub struct SessionInit {
    /// Generated when not supplied
    pub session_id: Option<String>,
    pub target_user: TwitterUser,
    pub options: SessionOptions,
}

/// Serializable view of a session for observers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub status: SessionStatus,
    pub progress: Progress,
    pub target: SessionInfoTarget,
    pub options: SessionOptions,
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfoTarget {
    pub user: TwitterUser,
    /// `None` while the size of the list is unknown
    pub total_count: Option<u64>,
}

#[derive(Debug)]
struct SessionState {
    status: SessionStatus,
    started: bool,
    limit: Option<Limit>,
    total_count: Option<u64>,
    drains: usize,
}

pub struct Session {
    id: String,
    target_user: TwitterUser,
    options: SessionOptions,
    client: Arc<dyn ChainBlockClient>,
    coordinator: RateLimitCoordinator,
    buffer_capacity: usize,
    events: broadcast::Sender<SessionEvent>,
    progress: ProgressTracker,
    stop_tx: watch::Sender<bool>,
    state: Mutex<SessionState>,
}

impl Session {
    /// Create a session with the default buffer capacity and cool-down
    pub fn new(init: SessionInit, client: Arc<dyn ChainBlockClient>) -> Self {
        Self::build(
            init,
            client,
            RateLimitCoordinator::default(),
            DEFAULT_CAPACITY,
            DEFAULT_EVENT_CAPACITY,
        )
    }

    pub fn with_config(
        init: SessionInit,
        client: Arc<dyn ChainBlockClient>,
        config: &Config,
    ) -> Self {
        Self::build(
            init,
            client,
            config.rate_limit.coordinator(),
            config.session.action_buffer_capacity,
            config.session.event_channel_capacity,
        )
    }

    fn build(
        init: SessionInit,
        client: Arc<dyn ChainBlockClient>,
        coordinator: RateLimitCoordinator,
        buffer_capacity: usize,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        let (stop_tx, _) = watch::channel(false);
        let total_count = match init.options.target_list {
            FollowKind::Followers => init.target_user.followers_count,
            FollowKind::Friends => init.target_user.friends_count,
        };

        Self {
            id: init
                .session_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            target_user: init.target_user,
            options: init.options,
            client,
            coordinator,
            buffer_capacity,
            progress: ProgressTracker::new(events.clone()),
            events,
            stop_tx,
            state: Mutex::new(SessionState {
                status: SessionStatus::Initial,
                started: false,
                limit: None,
                total_count: Some(total_count),
                drains: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target_user(&self) -> &TwitterUser {
        &self.target_user
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn status(&self) -> SessionStatus {
        self.state().status
    }

    pub fn limit(&self) -> Option<Limit> {
        self.state().limit
    }

    pub fn total_count(&self) -> Option<u64> {
        self.state().total_count
    }

    pub fn progress(&self) -> Progress {
        self.progress.snapshot()
    }

    /// Number of times the action buffer was drained with actions pending
    pub fn drain_count(&self) -> usize {
        self.state().drains
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn info(&self) -> SessionInfo {
        let state = self.state();
        SessionInfo {
            session_id: self.id.clone(),
            status: state.status,
            progress: self.progress.snapshot(),
            target: SessionInfoTarget {
                user: self.target_user.clone(),
                total_count: state.total_count,
            },
            options: self.options,
            limit: state.limit,
        }
    }

    fn publish(&self, event: SessionEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// Move to `next` unless the session already ended
    fn transition(&self, next: SessionStatus) -> bool {
        let mut state = self.state();
        if state.status.is_terminal() {
            return false;
        }
        if state.status != next {
            debug!("Session {}: {:?} -> {:?}", self.id, state.status, next);
            state.status = next;
            if next.is_terminal() {
                state.limit = None;
            }
            self.publish(SessionEvent::StateChanged(next));
        }
        true
    }

    fn set_limit(&self, limit: Option<Limit>) {
        let mut state = self.state();
        if state.status.is_terminal() {
            return;
        }
        state.limit = limit;
        match limit {
            Some(limit) => self.publish(SessionEvent::LimitActive(limit)),
            None => self.publish(SessionEvent::LimitCleared),
        }
    }

    fn update_total_count(&self, total: u64) {
        let mut state = self.state();
        if state.total_count != Some(total) {
            state.total_count = Some(total);
            self.publish(SessionEvent::CountChanged(Some(total)));
        }
    }

    fn stop_requested(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Stop the session immediately
    ///
    /// Pending block actions are abandoned: they are not cancelled, but their
    /// results no longer count. Returns `false` if the session had already
    /// ended.
    pub fn stop(&self) -> bool {
        self.stop_tx.send_replace(true);
        self.progress.seal();
        if self.transition(SessionStatus::Stopped) {
            self.publish(SessionEvent::Stopped);
            info!("Session {} stopped: {:?}", self.id, self.progress.snapshot());
            true
        } else {
            false
        }
    }

    fn complete(&self) {
        self.progress.seal();
        if self.transition(SessionStatus::Completed) {
            self.publish(SessionEvent::Completed);
            info!(
                "Session {} completed: {:?}",
                self.id,
                self.progress.snapshot()
            );
        }
    }

    fn fail(&self, error: &ChainBlockError) {
        self.progress.seal();
        if self.transition(SessionStatus::Error) {
            error!("Session {} failed: {}", self.id, error);
            self.publish(SessionEvent::Error(error.to_string()));
        }
    }

    /// Tell observers the session is being disposed, stopping it first if needed
    pub fn close(&self) {
        if !self.status().is_terminal() {
            self.stop();
        }
        self.publish(SessionEvent::Closed);
    }

    /// Run the session until the list is exhausted, it is stopped, or it fails
    ///
    /// A fatal error moves the session to `Error`, is published, and is
    /// returned here as well.
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = self.state();
            if state.started || state.status != SessionStatus::Initial {
                return Err(ChainBlockError::InvalidState(format!(
                    "session {} cannot start from {:?}",
                    self.id, state.status
                )));
            }
            state.started = true;
        }

        info!(
            "Starting session {} on {} of {}",
            self.id,
            self.options.target_list.list_endpoint(),
            self.target_user.screen_name
        );

        match self.run().await {
            Ok(()) => Ok(()),
            Err(e) if self.stop_requested() => {
                debug!("Session {} ignoring error after stop: {}", self.id, e);
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    async fn run(&self) -> Result<()> {
        let mut stop_rx = self.stop_tx.subscribe();
        let mut buffer = ActionBuffer::new(self.buffer_capacity);
        let mut members = walk_members(
            self.client.as_ref(),
            self.options.target_list,
            &self.target_user,
        );

        loop {
            if self.stop_requested() {
                buffer.discard();
                return Ok(());
            }

            let item = tokio::select! {
                biased;
                _ = wait_for_stop(&mut stop_rx) => None,
                item = members.next() => Some(item),
            };
            let item = match item {
                // stopped while waiting for the next page
                None => continue,
                Some(None) => break,
                Some(Some(item)) => item?,
            };

            match item {
                PageItem::Page { total_count, .. } => {
                    if self.status() == SessionStatus::RateLimited {
                        self.transition(SessionStatus::Running);
                        self.set_limit(None);
                        info!("Session {} resumed after rate limit", self.id);
                    } else {
                        self.transition(SessionStatus::Running);
                    }
                    if let Some(total) = total_count {
                        self.update_total_count(total);
                    }
                }
                PageItem::RateLimited => self.wait_out_rate_limit(&mut stop_rx).await,
                PageItem::Member(member) => {
                    self.handle_member(member, &mut buffer, &mut stop_rx).await
                }
            }
        }

        tokio::select! {
            biased;
            _ = wait_for_stop(&mut stop_rx) => {
                buffer.discard();
                return Ok(());
            }
            _ = buffer.drain() => {}
        }
        self.state().drains = buffer.drain_count();

        self.complete();
        Ok(())
    }

    async fn wait_out_rate_limit(&self, stop_rx: &mut watch::Receiver<bool>) {
        self.transition(SessionStatus::RateLimited);

        let window = tokio::select! {
            biased;
            _ = wait_for_stop(stop_rx) => return,
            window = self
                .coordinator
                .lookup_window(self.client.as_ref(), self.options.target_list) => window,
        };
        if window.is_some() {
            self.set_limit(window);
        }

        let pause = self.coordinator.cooldown_for(window.as_ref(), Utc::now());
        warn!(
            "Session {} rate limited on {}, pausing for {:?}",
            self.id,
            self.options.target_list.list_endpoint(),
            pause
        );

        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = wait_for_stop(stop_rx) => {}
        }
    }

    async fn handle_member(
        &self,
        member: TwitterUser,
        buffer: &mut ActionBuffer,
        stop_rx: &mut watch::Receiver<bool>,
    ) {
        let decision = classify(&member, &self.options);
        debug!("{} ({}): {:?}", member.screen_name, member.id_str, decision);

        match decision {
            Decision::Skip => {
                self.progress.increment(Counter::Skipped);
            }
            Decision::AlreadyBlocked => {
                self.progress.increment(Counter::AlreadyBlocked);
            }
            Decision::Block => {
                let client = Arc::clone(&self.client);
                let progress = self.progress.clone();
                let full = buffer.spawn(async move {
                    let counter = match client.issue_action(&member).await {
                        Ok(true) => Counter::BlockSuccess,
                        Ok(false) => {
                            debug!("Block of {} was declined", member.screen_name);
                            Counter::BlockFail
                        }
                        Err(e) => {
                            warn!("Failed to block {}: {}", member.screen_name, e);
                            Counter::BlockFail
                        }
                    };
                    if progress.increment(counter).is_none() {
                        debug!("Dropped block result for {}", member.screen_name);
                    }
                });

                if full {
                    tokio::select! {
                        biased;
                        // the loop discards what is left
                        _ = wait_for_stop(stop_rx) => {}
                        _ = buffer.drain() => {}
                    }
                    self.state().drains = buffer.drain_count();
                }
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("target", &self.target_user.screen_name)
            .field("options", &self.options)
            .field("status", &self.status())
            .finish()
    }
}

/// Resolves once a stop has been requested
async fn wait_for_stop(stop_rx: &mut watch::Receiver<bool>) {
    // the sender lives in the session, which outlives every run
    let _ = stop_rx.wait_for(|stopped| *stopped).await;
}
