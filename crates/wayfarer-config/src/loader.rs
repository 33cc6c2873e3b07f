use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_server()?;
        self.validate_cache()?;
        Ok(())
    }

    fn validate_server(&self) -> anyhow::Result<()> {
        let server = &self.server;

        if server.api_version.trim().is_empty() || server.api_version.contains('/') {
            anyhow::bail!("server.api_version must be a single non-empty path segment");
        }

        if server.health.enabled && !server.health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/'");
        }

        if let Some(ref rate_limit) = server.rate_limit {
            if rate_limit.requests == 0 {
                anyhow::bail!("server.rate_limit.requests must be greater than 0");
            }
            if rate_limit.window_duration()?.is_zero() {
                anyhow::bail!("server.rate_limit.window must be greater than 0");
            }
        }

        if let Some(ref cors) = server.cors
            && cors.credentials
            && cors.allows_any_origin()
        {
            anyhow::bail!("server.cors.credentials cannot be combined with a wildcard origin");
        }

        if server.http.body_limit_bytes == 0 {
            anyhow::bail!("server.http.body_limit_bytes must be greater than 0");
        }

        if server.http.security_headers && http::HeaderValue::from_str(&server.http.content_security_policy).is_err() {
            anyhow::bail!("server.http.content_security_policy is not a valid header value");
        }

        if let Some(ref auth) = server.auth
            && auth.enabled
            && auth.secret.expose_secret().is_empty()
        {
            anyhow::bail!("server.auth.secret must not be empty when auth is enabled");
        }

        Ok(())
    }

    fn validate_cache(&self) -> anyhow::Result<()> {
        if self.cache.default_ttl_seconds == 0 {
            anyhow::bail!("cache.default_ttl_seconds must be greater than 0");
        }

        if self.cache.reconnect.max_attempts == 0 {
            anyhow::bail!("cache.reconnect.max_attempts must be greater than 0");
        }

        Ok(())
    }
}
