use serde::{Deserialize, Serialize};

/// Account record as returned by the upstream user APIs
///
/// Relationship flags are relative to the authenticated caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterUser {
    pub id_str: String,
    pub screen_name: String,
    #[serde(default)]
    pub name: String,
    /// The user blocks the caller
    #[serde(default)]
    pub blocked_by: bool,
    /// The caller already blocks the user
    #[serde(default)]
    pub blocking: bool,
    #[serde(default)]
    pub muting: bool,
    /// The user follows the caller
    #[serde(default)]
    pub followed_by: bool,
    /// The caller follows the user
    #[serde(default)]
    pub following: bool,
    #[serde(default)]
    pub follow_request_sent: bool,
    #[serde(default)]
    pub friends_count: u64,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMention {
    pub id_str: String,
    pub screen_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetEntities {
    #[serde(default)]
    pub user_mentions: Vec<UserMention>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    pub id_str: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub favorite_count: u64,
    #[serde(default)]
    pub quote_count: u64,
    #[serde(default)]
    pub entities: TweetEntities,
}

/// Which relationship list of the target account a session walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowKind {
    Followers,
    Friends,
}

impl FollowKind {
    /// Upstream endpoint whose rate-limit window governs this list
    pub fn list_endpoint(&self) -> &'static str {
        match self {
            FollowKind::Followers => "/followers/list",
            FollowKind::Friends => "/friends/list",
        }
    }
}

/// What to do with a member in a given relationship to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAction {
    Skip,
    Block,
}

/// Policy frozen into a session at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    pub target_list: FollowKind,
    pub my_followers: UserAction,
    pub my_followings: UserAction,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            target_list: FollowKind::Followers,
            my_followers: UserAction::Skip,
            my_followings: UserAction::Skip,
        }
    }
}
