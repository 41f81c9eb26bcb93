//! Pre-flight validation of session requests
//!
//! Every rejection is a [`TargetCheckResult`] value; validation never fails
//! with an error and has no side effects.

use serde::{Deserialize, Serialize};

use crate::mentions::find_non_linked_mentions;
use crate::models::{Tweet, TwitterUser};
use crate::target::{Actor, RequestOptions, SessionRequest, SessionTarget, TargetList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetCheckResult {
    Ok,
    AlreadyRunningOnSameTarget,
    Protected,
    NoFollowers,
    NoFollowings,
    NoMutualFollowers,
    ChooseAtLeastOneOfReaction,
    NobodyWillBeBlocked,
    EmptyList,
    TheyBlockYou,
    CantChainBlockYourself,
    CantLockPickerToOther,
    InvalidSearchQuery,
}

impl TargetCheckResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, TargetCheckResult::Ok)
    }
}

/// Which reaction categories a tweet-reaction request selects
#[derive(Debug, Clone, Copy, Default)]
struct ReactionSelection {
    retweeters: bool,
    likers: bool,
    mentioned_users: bool,
    quoted_users: bool,
    non_linked_mentions: bool,
}

impl ReactionSelection {
    fn any(&self) -> bool {
        self.retweeters
            || self.likers
            || self.mentioned_users
            || self.quoted_users
            || self.non_linked_mentions
    }
}

pub fn validate_request(request: &SessionRequest) -> TargetCheckResult {
    match &request.target {
        SessionTarget::Follower { user, list } => check_follower_request(
            user,
            *list,
            &request.extra,
            &request.retriever,
            &request.executor,
        ),
        SessionTarget::TweetReaction {
            tweet,
            include_retweeters,
            include_likers,
            include_mentioned_users,
            include_quoted_users,
            include_non_linked_mentions,
        } => {
            let selection = ReactionSelection {
                retweeters: *include_retweeters,
                likers: *include_likers,
                mentioned_users: *include_mentioned_users,
                quoted_users: *include_quoted_users,
                non_linked_mentions: *include_non_linked_mentions,
            };
            check_tweet_reaction_request(tweet, selection, &request.extra)
        }
        SessionTarget::Import {
            user_ids,
            user_names,
        } => {
            if user_ids.is_empty() && user_names.is_empty() {
                TargetCheckResult::EmptyList
            } else {
                TargetCheckResult::Ok
            }
        }
        SessionTarget::LockPicker { user } => {
            check_lock_picker_request(user, &request.retriever, &request.executor)
        }
        SessionTarget::UserSearch { query } => {
            if query.trim().is_empty() {
                TargetCheckResult::InvalidSearchQuery
            } else {
                TargetCheckResult::Ok
            }
        }
        SessionTarget::ExportMyBlocklist => TargetCheckResult::Ok,
    }
}

fn check_follower_request(
    user: &TwitterUser,
    list: TargetList,
    extra: &RequestOptions,
    retriever: &Actor,
    executor: &Actor,
) -> TargetCheckResult {
    if user.protected && !user.following {
        return TargetCheckResult::Protected;
    }
    // self-targeting goes through the lock picker
    if user.id_str == retriever.user.id_str || user.id_str == executor.user.id_str {
        return TargetCheckResult::CantChainBlockYourself;
    }
    if user.blocked_by && !extra.enable_anti_block {
        return TargetCheckResult::TheyBlockYou;
    }
    match list {
        TargetList::Followers if user.followers_count == 0 => TargetCheckResult::NoFollowers,
        TargetList::Friends if user.friends_count == 0 => TargetCheckResult::NoFollowings,
        TargetList::MutualFollowers if user.followers_count == 0 || user.friends_count == 0 => {
            TargetCheckResult::NoMutualFollowers
        }
        _ => TargetCheckResult::Ok,
    }
}

fn check_tweet_reaction_request(
    tweet: &Tweet,
    selection: ReactionSelection,
    extra: &RequestOptions,
) -> TargetCheckResult {
    if !selection.any() {
        return TargetCheckResult::ChooseAtLeastOneOfReaction;
    }

    let mut total: u64 = 0;
    if selection.retweeters {
        total = total.saturating_add(tweet.retweet_count);
    }
    if selection.likers {
        total = total.saturating_add(tweet.favorite_count);
    }
    if selection.mentioned_users {
        total = total.saturating_add(tweet.entities.user_mentions.len() as u64);
    }
    if selection.quoted_users {
        total = total.saturating_add(tweet.quote_count);
    }
    if selection.non_linked_mentions {
        let found = find_non_linked_mentions(tweet, extra.non_linked_mention_pattern).len();
        total = total.saturating_add(found as u64);
    }

    if total == 0 {
        TargetCheckResult::NobodyWillBeBlocked
    } else {
        TargetCheckResult::Ok
    }
}

fn check_lock_picker_request(
    user: &TwitterUser,
    retriever: &Actor,
    executor: &Actor,
) -> TargetCheckResult {
    if user.followers_count == 0 {
        return TargetCheckResult::NoFollowers;
    }
    let same_identity =
        user.id_str == retriever.user.id_str && retriever.user.id_str == executor.user.id_str;
    if !same_identity {
        return TargetCheckResult::CantLockPickerToOther;
    }
    TargetCheckResult::Ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionOptions;

    fn user(id: &str, followers: u64, friends: u64) -> TwitterUser {
        TwitterUser {
            id_str: id.to_string(),
            screen_name: format!("user{}", id),
            followers_count: followers,
            friends_count: friends,
            ..Default::default()
        }
    }

    fn request(target: SessionTarget) -> SessionRequest {
        let me = Actor {
            user: user("me", 10, 10),
        };
        SessionRequest {
            target,
            options: SessionOptions::default(),
            extra: RequestOptions::default(),
            retriever: me.clone(),
            executor: me,
        }
    }

    #[test]
    fn test_protected_target_not_followed() {
        let mut target_user = user("1", 100, 100);
        target_user.protected = true;
        let req = request(SessionTarget::Follower {
            user: target_user.clone(),
            list: TargetList::Followers,
        });
        assert_eq!(validate_request(&req), TargetCheckResult::Protected);

        target_user.following = true;
        let req = request(SessionTarget::Follower {
            user: target_user,
            list: TargetList::Followers,
        });
        assert_eq!(validate_request(&req), TargetCheckResult::Ok);
    }

    #[test]
    fn test_cannot_chain_block_yourself() {
        let req = request(SessionTarget::Follower {
            user: user("me", 100, 100),
            list: TargetList::Followers,
        });
        assert_eq!(validate_request(&req), TargetCheckResult::CantChainBlockYourself);

        let mut req = request(SessionTarget::Follower {
            user: user("exec", 100, 100),
            list: TargetList::Followers,
        });
        req.executor = Actor {
            user: user("exec", 1, 1),
        };
        assert_eq!(validate_request(&req), TargetCheckResult::CantChainBlockYourself);
    }

    #[test]
    fn test_they_block_you_unless_anti_block() {
        let mut target_user = user("1", 100, 100);
        target_user.blocked_by = true;
        let mut req = request(SessionTarget::Follower {
            user: target_user,
            list: TargetList::Followers,
        });
        assert_eq!(validate_request(&req), TargetCheckResult::TheyBlockYou);

        req.extra.enable_anti_block = true;
        assert_eq!(validate_request(&req), TargetCheckResult::Ok);
    }

    #[test]
    fn test_empty_follow_lists() {
        let req = request(SessionTarget::Follower {
            user: user("1", 0, 5),
            list: TargetList::Followers,
        });
        assert_eq!(validate_request(&req), TargetCheckResult::NoFollowers);

        let req = request(SessionTarget::Follower {
            user: user("1", 5, 0),
            list: TargetList::Friends,
        });
        assert_eq!(validate_request(&req), TargetCheckResult::NoFollowings);

        let req = request(SessionTarget::Follower {
            user: user("1", 5, 0),
            list: TargetList::MutualFollowers,
        });
        assert_eq!(validate_request(&req), TargetCheckResult::NoMutualFollowers);

        // the count of the other list is irrelevant
        let req = request(SessionTarget::Follower {
            user: user("1", 0, 5),
            list: TargetList::Friends,
        });
        assert_eq!(validate_request(&req), TargetCheckResult::Ok);
    }

    fn reaction(tweet: Tweet, flags: [bool; 5]) -> SessionTarget {
        SessionTarget::TweetReaction {
            tweet,
            include_retweeters: flags[0],
            include_likers: flags[1],
            include_mentioned_users: flags[2],
            include_quoted_users: flags[3],
            include_non_linked_mentions: flags[4],
        }
    }

    #[test]
    fn test_tweet_reaction_requires_a_category() {
        let tweet = Tweet {
            id_str: "5".to_string(),
            retweet_count: 10,
            ..Default::default()
        };
        let req = request(reaction(tweet, [false; 5]));
        assert_eq!(
            validate_request(&req),
            TargetCheckResult::ChooseAtLeastOneOfReaction
        );
    }

    #[test]
    fn test_tweet_reaction_counts_only_selected_categories() {
        let tweet = Tweet {
            id_str: "5".to_string(),
            retweet_count: 0,
            favorite_count: 12,
            ..Default::default()
        };
        let req = request(reaction(tweet.clone(), [true, false, false, false, false]));
        assert_eq!(validate_request(&req), TargetCheckResult::NobodyWillBeBlocked);

        let req = request(reaction(tweet, [true, true, false, false, false]));
        assert_eq!(validate_request(&req), TargetCheckResult::Ok);
    }

    #[test]
    fn test_tweet_reaction_huge_counts_do_not_overflow() {
        let tweet = Tweet {
            id_str: "5".to_string(),
            retweet_count: u64::MAX,
            favorite_count: 1,
            quote_count: u64::MAX,
            ..Default::default()
        };
        let req = request(reaction(tweet, [true, true, false, true, false]));
        assert_eq!(validate_request(&req), TargetCheckResult::Ok);
    }

    #[test]
    fn test_tweet_reaction_non_linked_mentions() {
        let tweet = Tweet {
            id_str: "5".to_string(),
            text: "thanks @someone".to_string(),
            ..Default::default()
        };
        let req = request(reaction(tweet.clone(), [false, false, true, false, false]));
        assert_eq!(validate_request(&req), TargetCheckResult::NobodyWillBeBlocked);

        let req = request(reaction(tweet, [false, false, false, false, true]));
        assert_eq!(validate_request(&req), TargetCheckResult::Ok);
    }

    #[test]
    fn test_import_requires_ids_or_names() {
        let req = request(SessionTarget::Import {
            user_ids: vec![],
            user_names: vec![],
        });
        assert_eq!(validate_request(&req), TargetCheckResult::EmptyList);

        let req = request(SessionTarget::Import {
            user_ids: vec![],
            user_names: vec!["someone".to_string()],
        });
        assert_eq!(validate_request(&req), TargetCheckResult::Ok);
    }

    #[test]
    fn test_lock_picker_rules() {
        let req = request(SessionTarget::LockPicker {
            user: user("me", 10, 10),
        });
        assert_eq!(validate_request(&req), TargetCheckResult::Ok);

        let req = request(SessionTarget::LockPicker {
            user: user("other", 10, 10),
        });
        assert_eq!(validate_request(&req), TargetCheckResult::CantLockPickerToOther);

        let mut req = request(SessionTarget::LockPicker {
            user: user("me", 10, 10),
        });
        req.executor = Actor {
            user: user("second", 1, 1),
        };
        assert_eq!(validate_request(&req), TargetCheckResult::CantLockPickerToOther);

        let req = request(SessionTarget::LockPicker {
            user: user("me", 0, 10),
        });
        assert_eq!(validate_request(&req), TargetCheckResult::NoFollowers);
    }

    #[test]
    fn test_search_query_must_not_be_blank() {
        for query in ["", "   "] {
            let req = request(SessionTarget::UserSearch {
                query: query.to_string(),
            });
            assert_eq!(validate_request(&req), TargetCheckResult::InvalidSearchQuery);
        }

        let req = request(SessionTarget::UserSearch {
            query: "spam bots".to_string(),
        });
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn test_export_always_ok() {
        let req = request(SessionTarget::ExportMyBlocklist);
        assert_eq!(validate_request(&req), TargetCheckResult::Ok);
    }
}
