//! Member classification against a session's policy

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::models::{SessionOptions, TwitterUser, UserAction};

/// Outcome of classifying one member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    Skip,
    AlreadyBlocked,
    Block,
}

impl From<UserAction> for Decision {
    fn from(action: UserAction) -> Self {
        match action {
            UserAction::Skip => Decision::Skip,
            UserAction::Block => Decision::Block,
        }
    }
}

/// Decide what to do with a member
///
/// Checks run in a fixed order and the first match wins. Mutual connections
/// are checked before either one-directional policy, so they are always
/// skipped whatever the options say.
pub fn classify(member: &TwitterUser, options: &SessionOptions) -> Decision {
    if member.blocking {
        return Decision::AlreadyBlocked;
    }

    let is_my_follower = member.followed_by;
    let is_my_following = member.following;

    if is_my_follower && is_my_following {
        return Decision::Skip;
    }
    if is_my_follower {
        trace!("{} follows me: {:?}", member.screen_name, options.my_followers);
        return options.my_followers.into();
    }
    if is_my_following {
        trace!("I follow {}: {:?}", member.screen_name, options.my_followings);
        return options.my_followings.into();
    }

    Decision::Block
}
