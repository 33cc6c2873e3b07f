use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Cache and pub/sub configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default)]
    pub storage: CacheStorage,
    /// TTL applied when a write does not specify one
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            storage: CacheStorage::default(),
            default_ttl_seconds: default_ttl_seconds(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl CacheConfig {
    pub const fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

/// Cache storage backend
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheStorage {
    /// In-process storage (single instance only)
    #[default]
    Memory,
    /// Redis-backed storage and pub/sub
    Redis(RedisConfig),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: Url,
}

/// Backoff applied while (re)connecting to the store
///
/// Initial connects and subscriber reconnects grow linearly. Command and
/// publisher connection managers grow exponentially under the same cap.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    /// Delay added per attempt, in milliseconds
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    /// Upper bound on a single delay, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            step_ms: default_step_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl ReconnectConfig {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let millis = self.step_ms.saturating_mul(u64::from(attempt)).min(self.max_delay_ms);
        Duration::from_millis(millis)
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_ttl_seconds() -> u64 {
    3600
}

#[allow(clippy::missing_const_for_fn)]
fn default_step_ms() -> u64 {
    50
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_delay_ms() -> u64 {
    1000
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_attempts() -> u32 {
    10
}
