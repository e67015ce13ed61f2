//! Application configuration.

use crate::error::{AppError, AppResult};
use lotwatch_core::LotId;
use lotwatch_sync::{PollingConfig, SyncConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// Push channel settings (`[websocket]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsocketConfig {
    /// Fixed delay before each reconnection attempt.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

impl Default for WebsocketConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

/// Login credentials (`[auth]` section).
///
/// The password is wiped from memory when the config is dropped.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl AuthConfig {
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// REST base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Push channel URL.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default)]
    pub websocket: WebsocketConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    /// Log in at startup when present.
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    /// Lot to open in the detail view at startup.
    #[serde(default)]
    pub select_lot: Option<LotId>,
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_ws_url() -> String {
    "ws://127.0.0.1:8000/ws/parking/".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ws_url: default_ws_url(),
            websocket: WebsocketConfig::default(),
            polling: PollingConfig::default(),
            auth: None,
            select_lot: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::parse(&content)
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "api_url must be http(s): {}",
                self.api_url
            )));
        }
        if !(self.ws_url.starts_with("ws://") || self.ws_url.starts_with("wss://")) {
            return Err(AppError::Config(format!(
                "ws_url must be ws(s): {}",
                self.ws_url
            )));
        }
        if self.polling.interval_ms == 0 {
            return Err(AppError::Config(
                "polling.interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Credentials, if both fields are set.
    pub fn credentials(&self) -> Option<&AuthConfig> {
        self.auth.as_ref().filter(|a| a.is_complete())
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            reconnect_delay_ms: self.websocket.reconnect_delay_ms,
            polling: self.polling.clone(),
            ..SyncConfig::new(self.ws_url.clone())
        }
    }
}
