use std::time::Duration;

use serde::Deserialize;

/// Per-IP request rate limit for API routes
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    #[serde(default = "default_requests")]
    pub requests: u32,
    /// Window duration (e.g. "15m", "1h")
    #[serde(default = "default_window")]
    pub window: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: default_requests(),
            window: default_window(),
        }
    }
}

impl RateLimitConfig {
    /// Parse the window duration
    ///
    /// # Errors
    ///
    /// Returns an error if the window is not a valid duration string
    pub fn window_duration(&self) -> anyhow::Result<Duration> {
        duration_str::parse(&self.window).map_err(|e| anyhow::anyhow!("invalid rate limit window '{}': {e}", self.window))
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_requests() -> u32 {
    100
}

fn default_window() -> String {
    "15m".to_owned()
}
