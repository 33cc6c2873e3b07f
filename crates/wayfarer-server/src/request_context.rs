use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use http::Method;
use wayfarer_config::ClientIpConfig;

/// Request details kept for error reporting after the request is consumed
#[derive(Debug, Clone)]
pub struct RequestSummary {
    pub method: Method,
    pub path: String,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestSummary {
    pub fn capture(request: &Request, client_ip: ClientIpResolver) -> Self {
        let path = match request.uri().path() {
            "" => "/".to_owned(),
            path => path.to_owned(),
        };

        let user_agent = request
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        Self {
            method: request.method().clone(),
            path,
            client_ip: client_ip.resolve(request),
            user_agent,
        }
    }
}

/// Works out the client address of a request
///
/// Without trusted hops the socket peer is the client and proxy headers are
/// ignored. With `trusted_hops = N`, the client is the N-th
/// `X-Forwarded-For` entry counting from the right, since each trusted proxy
/// appends the address it received the request from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientIpResolver {
    trusted_hops: Option<usize>,
}

impl ClientIpResolver {
    pub fn new(config: Option<&ClientIpConfig>) -> Self {
        Self {
            trusted_hops: config.and_then(|c| c.trusted_hops).filter(|&hops| hops > 0),
        }
    }

    pub fn resolve(self, request: &Request) -> Option<String> {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        let Some(hops) = self.trusted_hops else {
            return peer;
        };

        if let Some(forwarded) = header(request, "x-forwarded-for") {
            let chain: Vec<&str> = forwarded.split(',').map(str::trim).filter(|a| !a.is_empty()).collect();
            if let Some(client) = chain.get(chain.len().saturating_sub(hops)) {
                return Some((*client).to_owned());
            }
        }

        if let Some(real_ip) = header(request, "x-real-ip")
            && !real_ip.trim().is_empty()
        {
            return Some(real_ip.trim().to_owned());
        }

        peer
    }
}

fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn from_peer(forwarded_for: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/api/v1/trips/1");
        if let Some(forwarded_for) = forwarded_for {
            builder = builder.header("x-forwarded-for", forwarded_for);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 5000))));
        request
    }

    fn trusting(hops: usize) -> ClientIpResolver {
        ClientIpResolver::new(Some(&ClientIpConfig {
            trusted_hops: Some(hops),
        }))
    }

    #[test]
    fn proxy_headers_are_ignored_by_default() {
        let mut request = from_peer(Some("203.0.113.7"));
        request
            .headers_mut()
            .insert("x-real-ip", http::HeaderValue::from_static("203.0.113.8"));

        assert_eq!(ClientIpResolver::default().resolve(&request).as_deref(), Some("192.0.2.1"));
        assert_eq!(ClientIpResolver::new(None).resolve(&request).as_deref(), Some("192.0.2.1"));
    }

    #[test]
    fn trusted_hops_skip_proxy_entries_from_the_right() {
        let request = from_peer(Some("198.51.100.9, 203.0.113.7, 10.0.0.1"));

        assert_eq!(trusting(1).resolve(&request).as_deref(), Some("10.0.0.1"));
        assert_eq!(trusting(2).resolve(&request).as_deref(), Some("203.0.113.7"));
        assert_eq!(trusting(10).resolve(&request).as_deref(), Some("198.51.100.9"));
    }

    #[test]
    fn zero_hops_trust_nothing() {
        let request = from_peer(Some("203.0.113.7"));

        assert_eq!(trusting(0).resolve(&request).as_deref(), Some("192.0.2.1"));
    }

    #[test]
    fn trusted_proxy_without_forwarded_for_falls_back() {
        let mut request = from_peer(None);
        assert_eq!(trusting(1).resolve(&request).as_deref(), Some("192.0.2.1"));

        request
            .headers_mut()
            .insert("x-real-ip", http::HeaderValue::from_static("203.0.113.8"));
        assert_eq!(trusting(1).resolve(&request).as_deref(), Some("203.0.113.8"));
    }

    #[test]
    fn summary_captures_method_path_and_agent() {
        let request = Request::builder()
            .method(Method::PUT)
            .uri("http://localhost/api/v1/trips/42?draft=true")
            .header(http::header::USER_AGENT, "wayfarer-app/1.0")
            .body(Body::empty())
            .unwrap();

        let summary = RequestSummary::capture(&request, ClientIpResolver::default());
        assert_eq!(summary.method, Method::PUT);
        assert_eq!(summary.path, "/api/v1/trips/42");
        assert_eq!(summary.user_agent.as_deref(), Some("wayfarer-app/1.0"));
        assert_eq!(summary.client_ip, None);
    }
}
