//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use secrecy::SecretString;
use wayfarer_config::{AuthConfig, ClientIpConfig, Config, CorsConfig, Environment, HttpConfig, RateLimitConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        let mut config = Config::default();
        config.server.listen_address = Some(SocketAddr::from(([127, 0, 0, 1], 0)));
        config.server.environment = Environment::Test;
        Self { config }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.config.server.environment = environment;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Set rate limit configuration
    pub fn with_rate_limit(mut self, requests: u32, window: &str) -> Self {
        self.config.server.rate_limit = Some(RateLimitConfig {
            requests,
            window: window.to_owned(),
        });
        self
    }

    /// Trust `hops` proxies in front of the server
    pub fn with_trusted_hops(mut self, hops: usize) -> Self {
        self.config.server.client_ip = Some(ClientIpConfig {
            trusted_hops: Some(hops),
        });
        self
    }

    /// Set body limit, compression and security header configuration
    pub fn with_http(mut self, config: HttpConfig) -> Self {
        self.config.server.http = config;
        self
    }

    /// Require HS256 bearer tokens signed with `secret`
    pub fn with_auth(mut self, secret: &str) -> Self {
        self.config.server.auth = Some(AuthConfig {
            enabled: true,
            secret: SecretString::from(secret.to_owned()),
            public_paths: vec!["/health".to_owned()],
        });
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config.validate().expect("test config is valid");
        self.config
    }
}
