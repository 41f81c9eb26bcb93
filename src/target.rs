//! Session targets and the requests that carry them

use serde::{Deserialize, Serialize};

use crate::mentions::MentionPattern;
use crate::models::{FollowKind, SessionOptions, Tweet, TwitterUser};

/// Relationship list named by a follower target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetList {
    Followers,
    Friends,
    MutualFollowers,
}

impl TargetList {
    /// List kind the engine can walk page by page, if any
    pub fn follow_kind(&self) -> Option<FollowKind> {
        match self {
            TargetList::Followers => Some(FollowKind::Followers),
            TargetList::Friends => Some(FollowKind::Friends),
            TargetList::MutualFollowers => None,
        }
    }
}

/// The object a session acts upon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionTarget {
    Follower {
        user: TwitterUser,
        list: TargetList,
    },
    TweetReaction {
        tweet: Tweet,
        #[serde(default)]
        include_retweeters: bool,
        #[serde(default)]
        include_likers: bool,
        #[serde(default)]
        include_mentioned_users: bool,
        #[serde(default)]
        include_quoted_users: bool,
        #[serde(default)]
        include_non_linked_mentions: bool,
    },
    Import {
        #[serde(default)]
        user_ids: Vec<String>,
        #[serde(default)]
        user_names: Vec<String>,
    },
    UserSearch {
        query: String,
    },
    #[serde(rename = "lockpicker")]
    LockPicker {
        user: TwitterUser,
    },
    ExportMyBlocklist,
}

impl SessionTarget {
    /// Short name of the target kind, used in logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            SessionTarget::Follower { .. } => "follower",
            SessionTarget::TweetReaction { .. } => "tweet_reaction",
            SessionTarget::Import { .. } => "import",
            SessionTarget::UserSearch { .. } => "user_search",
            SessionTarget::LockPicker { .. } => "lockpicker",
            SessionTarget::ExportMyBlocklist => "export_my_blocklist",
        }
    }
}

/// An account taking part in a request (the one reading lists or the one blocking)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user: TwitterUser,
}

/// Per-request switches that live outside the session policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    /// Allow targeting accounts that block the caller
    #[serde(default)]
    pub enable_anti_block: bool,
    #[serde(default)]
    pub non_linked_mention_pattern: MentionPattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub target: SessionTarget,
    pub options: SessionOptions,
    #[serde(default)]
    pub extra: RequestOptions,
    pub retriever: Actor,
    pub executor: Actor,
}

/// Whether two targets address the same logical object
///
/// Used to refuse a second concurrent session on a target that is already
/// being walked.
pub fn is_same_target(a: &SessionTarget, b: &SessionTarget) -> bool {
    match (a, b) {
        (SessionTarget::Follower { user: left, .. }, SessionTarget::Follower { user: right, .. }) => {
            left.id_str == right.id_str
        }
        (
            SessionTarget::TweetReaction { tweet: left, .. },
            SessionTarget::TweetReaction { tweet: right, .. },
        ) => left.id_str == right.id_str,
        // only one lock picker can exist per caller
        (SessionTarget::LockPicker { .. }, SessionTarget::LockPicker { .. }) => true,
        (SessionTarget::Import { .. }, SessionTarget::Import { .. }) => false,
        // search operators such as OR/AND are case sensitive
        (SessionTarget::UserSearch { query: left }, SessionTarget::UserSearch { query: right }) => {
            left == right
        }
        (SessionTarget::ExportMyBlocklist, SessionTarget::ExportMyBlocklist) => true,
        _ => false,
    }
}
