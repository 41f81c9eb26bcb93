//! Events published by a running session

use serde::{Deserialize, Serialize};

use crate::progress::Progress;
use crate::rate_limit::Limit;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    Initial,
    Running,
    RateLimited,
    Completed,
    Stopped,
    Error,
}

impl SessionStatus {
    /// Completed, Stopped and Error accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Stopped | SessionStatus::Error
        )
    }
}

/// Everything a subscriber can observe about a session
///
/// Payloads are copies; mutating them has no effect on the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum SessionEvent {
    StateChanged(SessionStatus),
    ProgressChanged(Progress),
    LimitActive(Limit),
    LimitCleared,
    Error(String),
    Stopped,
    Completed,
    Closed,
    CountChanged(Option<u64>),
}
