//! Sync engine configuration.

use lotwatch_ws::connection::DEFAULT_RECONNECT_DELAY_MS;
use serde::{Deserialize, Serialize};

/// Fallback polling settings (`[polling]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Interval between full-state polls.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Window after startup during which spots are polled even if push is live.
    #[serde(default = "default_fallback_grace_ms")]
    pub fallback_grace_ms: u64,
    /// Poll `/api/lots/for-my-permit/` instead of `/api/dashboard/` when logged in.
    #[serde(default)]
    pub filter_by_permit: bool,
    /// Keep polling the lot list while the push channel is live.
    #[serde(default = "default_while_live")]
    pub while_live: bool,
    /// Drop poll results that lost a race with a newer push write.
    #[serde(default = "default_discard_stale")]
    pub discard_stale: bool,
}

fn default_interval_ms() -> u64 {
    3000
}

fn default_fallback_grace_ms() -> u64 {
    2000
}

fn default_while_live() -> bool {
    true
}

fn default_discard_stale() -> bool {
    true
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            fallback_grace_ms: default_fallback_grace_ms(),
            filter_by_permit: false,
            while_live: default_while_live(),
            discard_stale: default_discard_stale(),
        }
    }
}

/// Everything the engine needs to start.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub ws_url: String,
    pub reconnect_delay_ms: u64,
    pub polling: PollingConfig,
    /// Capacity of the internal message queues.
    pub channel_capacity: usize,
}

impl SyncConfig {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            polling: PollingConfig::default(),
            channel_capacity: 256,
        }
    }
}
