use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Period between two countdown ticks.
pub const POLL_INTERVAL_MS: u64 = 100;

/// Fixed part of the delay before reloading the page at a contest boundary.
pub const RELOAD_BASE_MS: u64 = 1000;

/// Upper bound of the random part of the reload delay. Spreads the reload
/// burst of many clients watching the same contest.
pub const RELOAD_JITTER_MS: u64 = 3000;

/// Port the gRPC-web API listens on, on the same host that served the page.
pub const API_PORT: u16 = 56744;

/// Element id holding the embedded JSON context.
pub const CONTEXT_ANCHOR_ID: &str = "js_context";

/// Marker class of elements receiving countdown text.
pub const COUNTDOWN_CLASS: &str = "contest-countdown";

/// Marker class of timestamps rendered with their time zone name.
pub const LOCAL_DATE_CLASS: &str = "local_date";

/// Marker class of timestamps rendered without a zone.
pub const SIMPLE_LOCAL_DATE_CLASS: &str = "simple_local_date";

/// Data attribute holding the Unix timestamp of a date element.
pub const TIMESTAMP_ATTR: &str = "data-timestamp";

/// Request and response header carrying the session token.
pub const AUTHORIZATION_HEADER: &str = "authorization";

pub const TOKEN_KEY: &str = "token";
pub const USER_ID_KEY: &str = "user";
pub const PROFILE_KEY: &str = "profile";

/// Filter directive used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// Top-level configuration for the client engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Port of the gRPC-web API.
    pub api_port: u16,
    /// Countdown polling period in milliseconds.
    pub poll_interval_ms: u64,
    /// Fixed reload delay in milliseconds.
    pub reload_base_ms: u64,
    /// Maximum random reload delay added on top of the base, in milliseconds.
    pub reload_jitter_ms: u64,
    /// Also reload when the contest end is crossed.
    pub watch_contest_end: bool,
    /// File backing the persistent client storage. Empty keeps it in memory.
    pub storage_path: String,
    /// `tracing` filter directive applied by `telemetry::init_tracing`.
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_port: API_PORT,
            poll_interval_ms: POLL_INTERVAL_MS,
            reload_base_ms: RELOAD_BASE_MS,
            reload_jitter_ms: RELOAD_JITTER_MS,
            watch_contest_end: true,
            storage_path: String::new(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Parse a JSON config document; missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        if config.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be > 0"));
        }
        Ok(config)
    }

    /// Base address of the API for a page served from `hostname`.
    pub fn api_address(&self, hostname: &str) -> String {
        format!("http://{}:{}", hostname, self.api_port)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn reload_base(&self) -> Duration {
        Duration::from_millis(self.reload_base_ms)
    }

    pub fn reload_jitter(&self) -> Duration {
        Duration::from_millis(self.reload_jitter_ms)
    }
}
