use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use wayfarer_config::Environment;

use crate::request_context::ClientIpResolver;

/// Log every request on entry and on completion
///
/// Info level in development, debug otherwise.
pub async fn request_log_middleware(
    environment: Environment,
    client_ip: ClientIpResolver,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let ip = client_ip.resolve(&request).unwrap_or_else(|| "unknown".to_owned());
    let start = Instant::now();

    if environment.is_development() {
        tracing::info!(%method, %uri, %ip, "request received");
    } else {
        tracing::debug!(%method, %uri, %ip, "request received");
    }

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let elapsed = start.elapsed();

    if environment.is_development() {
        tracing::info!(%method, %uri, status, ?elapsed, "request completed");
    } else {
        tracing::debug!(%method, %uri, status, ?elapsed, "request completed");
    }

    response
}
