use http::header::{self, HeaderName};
use http::HeaderValue;
use wayfarer_config::HttpConfig;

/// Browser security headers added to every response that lacks them
///
/// # Errors
///
/// Returns an error if the configured content security policy is not a
/// valid header value
pub fn security_headers(config: &HttpConfig) -> anyhow::Result<Vec<(HeaderName, HeaderValue)>> {
    let csp = HeaderValue::from_str(&config.content_security_policy)
        .map_err(|e| anyhow::anyhow!("invalid content security policy: {e}"))?;

    Ok(vec![
        (header::CONTENT_SECURITY_POLICY, csp),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ),
        (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_api_needs() {
        let headers = security_headers(&HttpConfig::default()).unwrap();

        let csp = headers
            .iter()
            .find(|(name, _)| name == header::CONTENT_SECURITY_POLICY)
            .map(|(_, value)| value.to_str().unwrap());
        assert_eq!(
            csp,
            Some("default-src 'self'; style-src 'self' 'unsafe-inline'; script-src 'self'; img-src 'self' data: https:")
        );
        assert!(headers.iter().any(|(name, value)| name == header::X_CONTENT_TYPE_OPTIONS && value == "nosniff"));
    }

    #[test]
    fn rejects_policy_with_control_characters() {
        let config = HttpConfig {
            content_security_policy: "default-src\n'self'".to_owned(),
            ..HttpConfig::default()
        };

        assert!(security_headers(&config).is_err());
    }
}
