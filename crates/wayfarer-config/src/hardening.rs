use serde::Deserialize;

/// Request body, compression and response header hardening
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Largest accepted request body, in bytes
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
    /// Gzip responses for clients that accept it
    #[serde(default = "default_enabled")]
    pub compression: bool,
    /// Add browser security headers to every response
    #[serde(default = "default_enabled")]
    pub security_headers: bool,
    #[serde(default = "default_content_security_policy")]
    pub content_security_policy: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            body_limit_bytes: default_body_limit_bytes(),
            compression: true,
            security_headers: true,
            content_security_policy: default_content_security_policy(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_body_limit_bytes() -> usize {
    10 * 1024 * 1024
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

fn default_content_security_policy() -> String {
    "default-src 'self'; style-src 'self' 'unsafe-inline'; script-src 'self'; img-src 'self' data: https:".to_owned()
}
