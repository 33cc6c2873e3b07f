use std::net::SocketAddr;

use secrecy::SecretString;
use serde::Deserialize;

use crate::{client_ip::ClientIpConfig, cors::CorsConfig, hardening::HttpConfig, rate_limit::RateLimitConfig};

/// Runtime mode, gating how much diagnostic detail reaches clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
    Test,
}

impl Environment {
    /// Whether stacks and error details may be exposed
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    #[serde(default)]
    pub environment: Environment,
    /// Version segment of API routes (`/api/{api_version}/...`)
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub cors: Option<CorsConfig>,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    #[serde(default)]
    pub client_ip: Option<ClientIpConfig>,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            environment: Environment::default(),
            api_version: default_api_version(),
            health: HealthConfig::default(),
            cors: None,
            rate_limit: None,
            auth: None,
            client_ip: None,
            http: HttpConfig::default(),
        }
    }
}

fn default_api_version() -> String {
    "v1".to_owned()
}

/// Health check endpoint configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_health_path")]
    pub path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_health_path(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

fn default_health_path() -> String {
    "/health".to_owned()
}

/// Bearer token authentication for API routes
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// HMAC secret used to verify HS256 tokens
    pub secret: SecretString,
    /// Path prefixes served without a token
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec![default_health_path()]
}
