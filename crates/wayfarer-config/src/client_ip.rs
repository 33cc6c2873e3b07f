use serde::Deserialize;

/// Configuration for extracting client IP addresses
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientIpConfig {
    /// Number of trusted proxy hops for X-Forwarded-For
    ///
    /// Unset means proxy headers are ignored and the socket peer is the client.
    #[serde(default)]
    pub trusted_hops: Option<usize>,
}
