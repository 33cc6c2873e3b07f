#![allow(clippy::must_use_candidate)]

pub mod cache;
pub mod client_ip;
pub mod cors;
mod env;
pub mod hardening;
mod loader;
pub mod rate_limit;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use cache::*;
pub use client_ip::*;
pub use cors::*;
pub use env::ExpandError;
pub use hardening::*;
pub use rate_limit::*;
pub use server::*;
pub use telemetry::*;

/// Top-level Wayfarer configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Cache and pub/sub configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
