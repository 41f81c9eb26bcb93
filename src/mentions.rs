//! Detection of handles written in tweet text without a structured mention entity

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::Tweet;

const MAX_SCREEN_NAME_LEN: usize = 15;

/// `@name` not glued to a preceding word character
static COMMON_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^A-Za-z0-9_@＠])@([A-Za-z0-9_]+)").unwrap());

/// Also fullwidth at-signs and whitespace between the sign and the handle
static AGGRESSIVE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[@＠]\s*([A-Za-z0-9_]+)").unwrap());

/// How eagerly handles are recognised in free text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionPattern {
    #[default]
    Common,
    Aggressive,
}

impl MentionPattern {
    fn regex(&self) -> &'static Regex {
        match self {
            MentionPattern::Common => &COMMON_PATTERN,
            MentionPattern::Aggressive => &AGGRESSIVE_PATTERN,
        }
    }
}

/// Screen names written in the tweet text that the tweet's mention entities do not link
///
/// Comparison is case-insensitive and each name is reported once, in order of
/// first appearance.
pub fn find_non_linked_mentions(tweet: &Tweet, pattern: MentionPattern) -> Vec<String> {
    let linked: HashSet<String> = tweet
        .entities
        .user_mentions
        .iter()
        .map(|mention| mention.screen_name.to_lowercase())
        .collect();

    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for captures in pattern.regex().captures_iter(&tweet.text) {
        let Some(name) = captures.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if name.len() > MAX_SCREEN_NAME_LEN {
            continue;
        }
        let key = name.to_lowercase();
        if linked.contains(&key) || !seen.insert(key) {
            continue;
        }
        found.push(name.to_string());
    }

    found
}
