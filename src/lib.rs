//! Chain Block Session Engine
//!
//! Walks the followers or followings of a target account page by page and
//! blocks every member that the caller's policy does not exempt.
//!
//! # Overview
//!
//! - **Validation**: Pre-flight checks that refuse requests which cannot work
//! - **Classification**: Per-member skip / already-blocked / block decision
//! - **Progress**: Counters published to observers on every change
//! - **Rate Limits**: In-band cool-down when the list endpoint is limited
//! - **Action Buffer**: Bounded set of concurrently running block actions
//! - **Sessions**: Cancellable state machine tying the pieces together
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use chain_block::{config::Config, ChainBlockClient, SessionEvent, SessionManager};
//!
//! async fn run(client: Arc<dyn ChainBlockClient>, request: chain_block::SessionRequest)
//!     -> chain_block::Result<()>
//! {
//!     let config = Config::load("chain-block.toml".as_ref()).await?;
//!     chain_block::logging::init_tracing(&config.logging)?;
//!
//!     let manager = SessionManager::new(client, config);
//!     let session = manager.create_session(request)?;
//!     let mut events = session.subscribe();
//!
//!     let handle = manager.start_session(session.id())?;
//!     while let Ok(event) = events.recv().await {
//!         if let SessionEvent::ProgressChanged(progress) = event {
//!             println!("{} scraped", progress.total_scraped());
//!         }
//!     }
//!     handle.await.ok();
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`action_buffer`] - Bounded in-flight block actions
//! - [`classifier`] - Member classification
//! - [`client`] - Upstream API capabilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result aliases
//! - [`events`] - Session states and observer events
//! - [`logging`] - Tracing subscriber setup
//! - [`manager`] - Per-caller session registry
//! - [`mentions`] - Non-linked mention scanning for tweet targets
//! - [`models`] - Core data structures
//! - [`pagination`] - Cursor-based member stream
//! - [`progress`] - Progress counters
//! - [`rate_limit`] - Rate-limit windows and cool-down policy
//! - [`session`] - Session state machine
//! - [`target`] - Session targets and requests
//! - [`validator`] - Request validation

pub mod action_buffer;
pub mod classifier;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod manager;
pub mod mentions;
pub mod models;
pub mod pagination;
pub mod progress;
pub mod rate_limit;
pub mod session;
pub mod target;
pub mod validator;

// Re-export commonly used types for convenience
pub use error::{ChainBlockError, Result};

// Core data models
pub use models::{FollowKind, SessionOptions, Tweet, TwitterUser, UserAction};

// Targets and validation
pub use target::{is_same_target, Actor, RequestOptions, SessionRequest, SessionTarget, TargetList};
pub use validator::{validate_request, TargetCheckResult};

// Classifier types
pub use classifier::{classify, Decision};

// Client trait
pub use client::{ChainBlockClient, Cursor, MemberPage};

// Session types
pub use events::{SessionEvent, SessionStatus};
pub use manager::SessionManager;
pub use progress::{Counter, Progress};
pub use rate_limit::{CooldownMode, Limit, LimitStatus, RateLimitCoordinator};
pub use session::{Session, SessionInfo, SessionInit};
