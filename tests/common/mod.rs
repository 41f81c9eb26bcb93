//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use chain_block::client::{ChainBlockClient, Cursor, MemberPage};
use chain_block::error::{ChainBlockError, Result};
use chain_block::models::{FollowKind, SessionOptions, TwitterUser, UserAction};
use chain_block::rate_limit::{Limit, LimitStatus};
use chain_block::target::{Actor, RequestOptions, SessionRequest, SessionTarget, TargetList};
use chain_block::SessionEvent;
use mockall::mock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;

mock! {
    pub Upstream {}

    #[async_trait]
    impl ChainBlockClient for Upstream {
        async fn fetch_member_page(
            &self,
            kind: FollowKind,
            target: &TwitterUser,
            cursor: &Cursor,
        ) -> Result<MemberPage>;
        async fn issue_action(&self, member: &TwitterUser) -> Result<bool>;
        async fn fetch_rate_limit_status(&self) -> Result<LimitStatus>;
    }
}

/// Create a member with no relationship to the caller
pub fn create_stranger(id: &str) -> TwitterUser {
    TwitterUser {
        id_str: id.to_string(),
        screen_name: format!("user_{}", id),
        name: format!("User {}", id),
        ..Default::default()
    }
}

/// Create a member that follows the caller and is followed back
pub fn create_mutual(id: &str) -> TwitterUser {
    let mut user = create_stranger(id);
    user.followed_by = true;
    user.following = true;
    user
}

/// Create a member the caller already blocks
pub fn create_blocked(id: &str) -> TwitterUser {
    let mut user = create_stranger(id);
    user.blocking = true;
    user
}

pub fn create_target(followers_count: u64, friends_count: u64) -> TwitterUser {
    TwitterUser {
        id_str: "target".to_string(),
        screen_name: "target_account".to_string(),
        name: "Target".to_string(),
        followers_count,
        friends_count,
        ..Default::default()
    }
}

pub fn create_caller() -> TwitterUser {
    TwitterUser {
        id_str: "me".to_string(),
        screen_name: "me".to_string(),
        name: "Me".to_string(),
        followers_count: 10,
        friends_count: 10,
        ..Default::default()
    }
}

/// Pages of strangers with ids numbered from zero
pub fn stranger_pages(pages: usize, per_page: usize) -> Vec<Vec<TwitterUser>> {
    (0..pages)
        .map(|page| {
            (0..per_page)
                .map(|i| create_stranger(&(page * per_page + i).to_string()))
                .collect()
        })
        .collect()
}

pub fn skip_both() -> SessionOptions {
    SessionOptions {
        target_list: FollowKind::Followers,
        my_followers: UserAction::Skip,
        my_followings: UserAction::Skip,
    }
}

/// Follower-list request by the caller against `target`
pub fn follower_request(target: TwitterUser, list: TargetList) -> SessionRequest {
    SessionRequest {
        target: SessionTarget::Follower { user: target, list },
        options: skip_both(),
        extra: RequestOptions::default(),
        retriever: Actor {
            user: create_caller(),
        },
        executor: Actor {
            user: create_caller(),
        },
    }
}

/// Drain every event currently buffered in a receiver
pub fn collect_events(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

fn page_cursor(index: usize) -> Cursor {
    if index == 0 {
        Cursor::start()
    } else {
        Cursor::new(format!("page-{}", index))
    }
}

fn page_index(cursor: &Cursor) -> usize {
    cursor
        .as_str()
        .strip_prefix("page-")
        .and_then(|index| index.parse().ok())
        .unwrap_or(0)
}

/// In-memory upstream serving scripted pages
///
/// Records every fetch and every action, and tracks how many actions run at
/// the same time.
#[derive(Default)]
pub struct FakeClient {
    pages: Vec<Vec<TwitterUser>>,
    report_totals: bool,
    rate_limits: Mutex<HashMap<usize, usize>>,
    fatal_page: Option<usize>,
    failing_ids: HashSet<String>,
    declined_ids: HashSet<String>,
    action_delay: Duration,
    status_fails: bool,
    status_delay: Duration,
    fetches: Mutex<Vec<usize>>,
    actions: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeClient {
    pub fn new(pages: Vec<Vec<TwitterUser>>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    /// Report the sum of all pages as the list total on every page
    pub fn with_totals(mut self) -> Self {
        self.report_totals = true;
        self
    }

    /// Answer `times` fetches of page `index` with a rate limit first
    pub fn rate_limit_page(self, index: usize, times: usize) -> Self {
        self.rate_limits
            .lock()
            .unwrap()
            .insert(index, times);
        self
    }

    /// Fail fetching page `index` with a non rate-limit error
    pub fn fail_page(mut self, index: usize) -> Self {
        self.fatal_page = Some(index);
        self
    }

    pub fn failing_actions(mut self, ids: &[&str]) -> Self {
        self.failing_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn declined_actions(mut self, ids: &[&str]) -> Self {
        self.declined_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn action_delay(mut self, delay: Duration) -> Self {
        self.action_delay = delay;
        self
    }

    pub fn failing_status(mut self) -> Self {
        self.status_fails = true;
        self
    }

    /// Make reading the rate-limit windows take `delay`
    pub fn status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = delay;
        self
    }

    /// Page indexes in fetch order
    pub fn fetches(&self) -> Vec<usize> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    /// Member ids in the order their actions started
    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainBlockClient for FakeClient {
    async fn fetch_member_page(
        &self,
        _kind: FollowKind,
        _target: &TwitterUser,
        cursor: &Cursor,
    ) -> Result<MemberPage> {
        let index = page_index(cursor);
        self.fetches.lock().unwrap().push(index);

        if let Some(remaining) = self.rate_limits.lock().unwrap().get_mut(&index) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ChainBlockError::RateLimited {
                    endpoint: "/followers/list".to_string(),
                });
            }
        }
        if self.fatal_page == Some(index) {
            return Err(ChainBlockError::ApiError("HTTP 401 Unauthorized".to_string()));
        }

        let members = self.pages.get(index).cloned().unwrap_or_default();
        let next_cursor = if index + 1 < self.pages.len() {
            Some(page_cursor(index + 1))
        } else {
            None
        };
        let total_count = if self.report_totals {
            Some(self.pages.iter().map(|page| page.len() as u64).sum())
        } else {
            None
        };

        Ok(MemberPage {
            members,
            next_cursor,
            total_count,
        })
    }

    async fn issue_action(&self, member: &TwitterUser) -> Result<bool> {
        self.actions.lock().unwrap().push(member.id_str.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.action_delay.is_zero() {
            tokio::time::sleep(self.action_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_ids.contains(&member.id_str) {
            return Err(ChainBlockError::NetworkError("connection reset".to_string()));
        }
        Ok(!self.declined_ids.contains(&member.id_str))
    }

    async fn fetch_rate_limit_status(&self) -> Result<LimitStatus> {
        if !self.status_delay.is_zero() {
            tokio::time::sleep(self.status_delay).await;
        }
        if self.status_fails {
            return Err(ChainBlockError::NetworkError("status unavailable".to_string()));
        }
        let window = Limit {
            limit: 15,
            remaining: 0,
            reset: chrono::Utc::now().timestamp() + 900,
        };
        Ok(LimitStatus {
            followers: window,
            friends: window,
        })
    }
}
