use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chat::replies::DEFAULT_REPLIES;
use crate::common::{DeliveryState, Participant};

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Timings and script for one simulated conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub local_user: Participant,
    pub remote_user: Participant,
    /// Delay between sending and the message settling.
    pub delivery_delay_ms: u64,
    /// Delay between sending and the scripted reply; must exceed the delivery delay.
    pub reply_delay_ms: u64,
    pub typing_timeout_ms: u64,
    /// State an outbound message settles in once delivered.
    pub settle_state: DeliveryState,
    /// Show the remote user typing between delivery and reply.
    pub typing_before_reply: bool,
    /// Answer with a scripted reply when a typing indicator times out.
    pub reply_on_typing_timeout: bool,
    pub replies: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            local_user: Participant::new("me", "You"),
            remote_user: Participant::new("alex", "Alex"),
            delivery_delay_ms: 1_000,
            reply_delay_ms: 3_000,
            typing_timeout_ms: 3_000,
            settle_state: DeliveryState::Delivered,
            typing_before_reply: true,
            reply_on_typing_timeout: false,
            replies: DEFAULT_REPLIES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl AppConfig {
    pub fn delivery_delay(&self) -> Duration {
        Duration::from_millis(self.delivery_delay_ms)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn typing_timeout(&self) -> Duration {
        Duration::from_millis(self.typing_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settle_state == DeliveryState::Sending {
            return Err(ConfigError::Invalid(
                "settle_state must be sent, delivered or read".to_string(),
            ));
        }
        if self.reply_delay_ms <= self.delivery_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "reply_delay_ms ({}) must be greater than delivery_delay_ms ({})",
                self.reply_delay_ms, self.delivery_delay_ms
            )));
        }
        if self.typing_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "typing_timeout_ms must be positive".to_string(),
            ));
        }
        if self.local_user.id == self.remote_user.id {
            return Err(ConfigError::Invalid(format!(
                "local and remote user share the id `{}`",
                self.local_user.id
            )));
        }
        Ok(())
    }
}

pub fn try_load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = serde_json::from_str::<AppConfig>(&content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match try_load_config(path) {
        Ok(config) => config,
        Err(ConfigError::Io(err)) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
        Err(err) => {
            log::warn!("Failed to load config file {}: {err}", path.display());
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}
