//! Upstream rate-limit windows and the cool-down taken when a walk is limited
//!
//! The list endpoints report a window per endpoint:
//! - `/followers/list` governs walks over followers
//! - `/friends/list` governs walks over followings
//!
//! The two windows are tracked separately and a session only ever looks at
//! the one for the list it walks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::ChainBlockClient;
use crate::models::FollowKind;

/// Default pause after a rate-limit signal
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Shortest pause taken when waiting for a reported reset
const MIN_RESET_WAIT: Duration = Duration::from_secs(1);

/// One upstream rate-limit window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp (seconds) at which the window resets
    pub reset: i64,
}

impl Limit {
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.reset, 0)
    }
}

/// Windows of the list endpoints a session can walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitStatus {
    pub followers: Limit,
    pub friends: Limit,
}

impl LimitStatus {
    pub fn window_for(&self, kind: FollowKind) -> Limit {
        match kind {
            FollowKind::Followers => self.followers,
            FollowKind::Friends => self.friends,
        }
    }
}

/// How long to pause after a rate-limit signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CooldownMode {
    /// Always wait the configured cool-down
    #[default]
    Fixed,
    /// Wait until the reported reset time, falling back to the cool-down
    UntilReset,
}

/// Handles the rate-limit side of a session walk
#[derive(Debug, Clone)]
pub struct RateLimitCoordinator {
    mode: CooldownMode,
    cooldown: Duration,
}

impl RateLimitCoordinator {
    pub fn new(mode: CooldownMode, cooldown: Duration) -> Self {
        Self { mode, cooldown }
    }

    /// Fetch the current window for a list kind
    ///
    /// Failing to read the windows does not end the session; the pause is
    /// still taken, just without a window to report.
    pub async fn lookup_window(
        &self,
        client: &dyn ChainBlockClient,
        kind: FollowKind,
    ) -> Option<Limit> {
        match client.fetch_rate_limit_status().await {
            Ok(status) => {
                let window = status.window_for(kind);
                debug!(
                    "Limit window for {}: {}/{} remaining, resets at {}",
                    kind.list_endpoint(),
                    window.remaining,
                    window.limit,
                    window.reset
                );
                Some(window)
            }
            Err(e) => {
                warn!("Failed to fetch rate limit status: {}", e);
                None
            }
        }
    }

    /// Pause to take before retrying the same cursor
    pub fn cooldown_for(&self, window: Option<&Limit>, now: DateTime<Utc>) -> Duration {
        match (self.mode, window.and_then(Limit::reset_at)) {
            (CooldownMode::UntilReset, Some(reset_at)) => (reset_at - now)
                .to_std()
                .unwrap_or(MIN_RESET_WAIT)
                .max(MIN_RESET_WAIT),
            _ => self.cooldown,
        }
    }
}

impl Default for RateLimitCoordinator {
    fn default() -> Self {
        Self::new(CooldownMode::Fixed, DEFAULT_COOLDOWN)
    }
}
