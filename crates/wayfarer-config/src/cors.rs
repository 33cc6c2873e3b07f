use std::time::Duration;

use serde::Deserialize;

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins; `["*"]` allows any origin
    #[serde(default = "default_origins")]
    pub origins: Vec<String>,
    /// Allow credentials (cannot be combined with a wildcard origin)
    #[serde(default)]
    pub credentials: bool,
    /// Max age for preflight cache in seconds
    #[serde(default)]
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_origins(),
            credentials: false,
            max_age: None,
        }
    }
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.origins.iter().any(|o| o == "*")
    }

    pub fn max_age_duration(&self) -> Option<Duration> {
        self.max_age.map(Duration::from_secs)
    }
}

// Expo web dev server
fn default_origins() -> Vec<String> {
    vec!["http://localhost:19006".to_owned()]
}
