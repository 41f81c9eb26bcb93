use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ChainBlockError, Result};
use crate::mentions::MentionPattern;
use crate::rate_limit::{CooldownMode, RateLimitCoordinator};
use crate::target::RequestOptions;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub requests: RequestConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_action_buffer_capacity")]
    pub action_buffer_capacity: usize,
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            action_buffer_capacity: default_action_buffer_capacity(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub mode: CooldownMode,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            mode: CooldownMode::default(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl RateLimitConfig {
    pub fn coordinator(&self) -> RateLimitCoordinator {
        RateLimitCoordinator::new(self.mode, Duration::from_secs(self.cooldown_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RequestConfig {
    #[serde(default)]
    pub enable_anti_block: bool,
    #[serde(default)]
    pub non_linked_mention_pattern: MentionPattern,
}

impl RequestConfig {
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions {
            enable_anti_block: self.enable_anti_block,
            non_linked_mention_pattern: self.non_linked_mention_pattern,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_action_buffer_capacity() -> usize {
    150
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // If file doesn't exist, return default config with warning
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ChainBlockError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            ChainBlockError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ChainBlockError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            ChainBlockError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        tokio::fs::write(path, content).await.map_err(|e| {
            ChainBlockError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.session.action_buffer_capacity == 0 {
            return Err(ChainBlockError::ConfigError(
                "session.action_buffer_capacity must be at least 1".to_string(),
            ));
        }
        // each pending action is one outstanding upstream request
        if self.session.action_buffer_capacity > 1000 {
            return Err(ChainBlockError::ConfigError(
                "session.action_buffer_capacity cannot exceed 1000".to_string(),
            ));
        }

        if self.session.event_channel_capacity == 0 {
            return Err(ChainBlockError::ConfigError(
                "session.event_channel_capacity must be at least 1".to_string(),
            ));
        }

        if self.rate_limit.cooldown_secs == 0 {
            return Err(ChainBlockError::ConfigError(
                "rate_limit.cooldown_secs must be greater than 0".to_string(),
            ));
        }
        if self.rate_limit.cooldown_secs > 3600 {
            return Err(ChainBlockError::ConfigError(
                "rate_limit.cooldown_secs cannot exceed 3600 (1 hour)".to_string(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ChainBlockError::ConfigError(format!(
                    "Invalid logging.level: '{}'. Must be 'trace', 'debug', 'info', 'warn', or 'error'",
                    other
                )));
            }
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        let config = Self::default();
        config.save(path).await
    }
}
