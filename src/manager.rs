//! Registry of sessions owned by one caller

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::ChainBlockClient;
use crate::config::Config;
use crate::error::{ChainBlockError, Result};
use crate::mentions::MentionPattern;
use crate::models::SessionOptions;
use crate::session::{Session, SessionInfo, SessionInit};
use crate::target::{is_same_target, RequestOptions, SessionRequest, SessionTarget};
use crate::validator::{validate_request, TargetCheckResult};

struct ManagedSession {
    session: Arc<Session>,
    target: SessionTarget,
}

pub struct SessionManager {
    client: Arc<dyn ChainBlockClient>,
    config: Config,
    sessions: Mutex<HashMap<String, ManagedSession>>,
}

impl SessionManager {
    pub fn new(client: Arc<dyn ChainBlockClient>, config: Config) -> Self {
        Self {
            client,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, ManagedSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request switches with the configured `[requests]` defaults applied
    ///
    /// A request can turn anti-block on or ask for the aggressive mention
    /// pattern, but it cannot turn off what the configuration enables.
    fn request_options(&self, extra: &RequestOptions) -> RequestOptions {
        let defaults = self.config.requests.request_options();
        RequestOptions {
            enable_anti_block: extra.enable_anti_block || defaults.enable_anti_block,
            non_linked_mention_pattern: match extra.non_linked_mention_pattern {
                MentionPattern::Common => defaults.non_linked_mention_pattern,
                pattern => pattern,
            },
        }
    }

    /// Validate a request and refuse duplicates of a session still in progress
    pub fn check_request(&self, request: &SessionRequest) -> TargetCheckResult {
        let mut request = request.clone();
        request.extra = self.request_options(&request.extra);
        check_against(&self.sessions(), &request)
    }

    /// Validate the request and register a new session for it
    ///
    /// Only follower targets over the followers or friends list have a member
    /// source in this crate.
    pub fn create_session(&self, mut request: SessionRequest) -> Result<Arc<Session>> {
        request.extra = self.request_options(&request.extra);
        let mut sessions = self.sessions();

        let result = check_against(&sessions, &request);
        if !result.is_ok() {
            debug!("Rejected {} request: {:?}", request.target.kind(), result);
            return Err(ChainBlockError::Rejected(result));
        }

        let (user, kind) = match &request.target {
            SessionTarget::Follower { user, list } => match list.follow_kind() {
                Some(kind) => (user.clone(), kind),
                None => {
                    return Err(ChainBlockError::UnsupportedTarget(format!(
                        "{:?} of {}",
                        list, user.screen_name
                    )))
                }
            },
            other => {
                return Err(ChainBlockError::UnsupportedTarget(other.kind().to_string()));
            }
        };

        let init = SessionInit {
            session_id: None,
            target_user: user,
            // the list named by the target wins over the request options
            options: SessionOptions {
                target_list: kind,
                ..request.options
            },
        };
        let session = Arc::new(Session::with_config(
            init,
            Arc::clone(&self.client),
            &self.config,
        ));

        info!(
            "Created session {} for {} of {}",
            session.id(),
            kind.list_endpoint(),
            session.target_user().screen_name
        );
        sessions.insert(
            session.id().to_string(),
            ManagedSession {
                session: Arc::clone(&session),
                target: request.target,
            },
        );
        Ok(session)
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions()
            .get(session_id)
            .map(|managed| Arc::clone(&managed.session))
    }

    fn require(&self, session_id: &str) -> Result<Arc<Session>> {
        self.get(session_id)
            .ok_or_else(|| ChainBlockError::SessionNotFound(session_id.to_string()))
    }

    /// Run a session on its own task
    pub fn start_session(&self, session_id: &str) -> Result<JoinHandle<Result<()>>> {
        let session = self.require(session_id)?;
        Ok(tokio::spawn(async move { session.start().await }))
    }

    pub fn stop_session(&self, session_id: &str) -> Result<bool> {
        Ok(self.require(session_id)?.stop())
    }

    /// Stop every session still in progress, returning how many were stopped
    pub fn stop_all(&self) -> usize {
        let sessions: Vec<Arc<Session>> = self
            .sessions()
            .values()
            .map(|managed| Arc::clone(&managed.session))
            .collect();

        let stopped = sessions.iter().filter(|session| session.stop()).count();
        if stopped > 0 {
            info!("Stopped {} sessions", stopped);
        }
        stopped
    }

    /// Drop sessions that reached a terminal state
    pub fn cleanup_inactive(&self) -> usize {
        let removed: Vec<ManagedSession> = {
            let mut sessions = self.sessions();
            let ids: Vec<String> = sessions
                .iter()
                .filter(|(_, managed)| managed.session.status().is_terminal())
                .map(|(id, _)| id.clone())
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for managed in &removed {
            managed.session.close();
        }
        if !removed.is_empty() {
            debug!("Cleaned up {} inactive sessions", removed.len());
        }
        removed.len()
    }

    pub fn sessions_info(&self) -> Vec<SessionInfo> {
        self.sessions()
            .values()
            .map(|managed| managed.session.info())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }
}

fn check_against(
    sessions: &HashMap<String, ManagedSession>,
    request: &SessionRequest,
) -> TargetCheckResult {
    let result = validate_request(request);
    if !result.is_ok() {
        return result;
    }

    let duplicate = sessions.values().any(|managed| {
        !managed.session.status().is_terminal() && is_same_target(&managed.target, &request.target)
    });
    if duplicate {
        TargetCheckResult::AlreadyRunningOnSameTarget
    } else {
        TargetCheckResult::Ok
    }
}
