//! Capabilities the engine needs from the upstream API
//!
//! The concrete network client lives outside this crate; sessions receive it
//! as an `Arc<dyn ChainBlockClient>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{FollowKind, TwitterUser};
use crate::rate_limit::LimitStatus;

/// Opaque, stable pagination cursor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor(String);

impl Cursor {
    /// Cursor of the first page (`-1` upstream)
    pub fn start() -> Self {
        Self("-1".to_string())
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::start()
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a relationship list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberPage {
    pub members: Vec<TwitterUser>,
    /// `None` on the last page
    pub next_cursor: Option<Cursor>,
    /// Size of the whole list, when the endpoint reports it
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// Trait defining upstream operations for easier testing
#[async_trait]
pub trait ChainBlockClient: Send + Sync {
    /// Fetch one page of the target's followers or followings
    ///
    /// Returns `ChainBlockError::RateLimited` when the list endpoint is
    /// limited; the same cursor can be retried later.
    async fn fetch_member_page(
        &self,
        kind: FollowKind,
        target: &TwitterUser,
        cursor: &Cursor,
    ) -> Result<MemberPage>;

    /// Block a member, returning whether upstream confirmed the block
    async fn issue_action(&self, member: &TwitterUser) -> Result<bool>;

    /// Current rate-limit windows of the list endpoints
    async fn fetch_rate_limit_status(&self) -> Result<LimitStatus>;
}
