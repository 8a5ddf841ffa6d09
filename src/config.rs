use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";

pub const API_URL_ENV: &str = "SUPPORT_CHAT_API_URL";
pub const WS_URL_ENV: &str = "SUPPORT_CHAT_WS_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base of the REST collaborators (`/my-messages`, `/mark-read`).
    pub api_base_url: String,
    /// Support channel WebSocket endpoint.
    pub ws_url: String,
    /// Buffer size of the channel pump queues.
    pub channel_capacity: usize,
    pub request_timeout_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api/chat".to_string(),
            ws_url: "ws://localhost:8080/chat".to_string(),
            channel_capacity: 100,
            request_timeout_ms: 10_000,
        }
    }
}

pub fn load_config(path: &str) -> ChatConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|err| {
            log::warn!("Failed to parse config file {}: {err}", path.display());
            ChatConfig::default()
        }),
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            ChatConfig::default()
        }
    }
}

pub fn parse_config(content: &str) -> serde_json::Result<ChatConfig> {
    serde_json::from_str::<ChatConfig>(content)
}

/// Environment variables (typically from `.env`) win over the file.
pub fn apply_env_overrides(config: &mut ChatConfig) {
    apply_overrides(config, |key| env::var(key).ok());
}

fn apply_overrides(config: &mut ChatConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
        log::info!("Using {API_URL_ENV}={url}");
        config.api_base_url = url;
    }
    if let Some(url) = lookup(WS_URL_ENV).filter(|url| !url.trim().is_empty()) {
        log::info!("Using {WS_URL_ENV}={url}");
        config.ws_url = url;
    }
}
