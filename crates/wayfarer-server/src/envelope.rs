//! Error envelope rendering
//!
//! Handlers and middleware only classify failures (see
//! [`HandlerError`](crate::HandlerError)). This middleware is the single
//! place that turns a classified failure into the JSON body clients see:
//!
//! ```json
//! {
//!   "success": false,
//!   "error": { "code": "NOT_FOUND", "message": "Trip not found" },
//!   "timestamp": "2026-03-01T09:30:00.000Z",
//!   "path": "/api/v1/trips/42"
//! }
//! ```
//!
//! In development mode the `error` object also carries `stack` and
//! `details`, and every failure is logged with its request context.
//! Axum's bodiless 405 for a known path with an unsupported method is
//! rendered as the same route-not-found envelope as an unknown path.

use axum::body::Body;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{HeaderValue, StatusCode, header};
use serde::Serialize;
use wayfarer_config::Environment;

use crate::error::{ErrorReport, HandlerError};
use crate::request_context::{ClientIpResolver, RequestSummary};

#[derive(Serialize)]
struct Envelope<'a> {
    success: bool,
    error: EnvelopeError<'a>,
    timestamp: String,
    path: &'a str,
}

#[derive(Serialize)]
struct EnvelopeError<'a> {
    code: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a serde_json::Value>,
}

/// Render classified failures from inner layers as error envelopes
pub async fn envelope_middleware(
    environment: Environment,
    client_ip: ClientIpResolver,
    request: Request,
    next: Next,
) -> Response {
    let summary = RequestSummary::capture(&request, client_ip);
    let mut response = next.run(request).await;

    let report = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => report,
        None if response.status() == StatusCode::METHOD_NOT_ALLOWED => {
            ErrorReport::from(&HandlerError::route_not_found(&summary.method, &summary.path))
        }
        None => return response,
    };

    log_failure(&report, &summary, environment);

    match render(&report, &summary, environment) {
        Ok(body) => {
            let (mut parts, _) = response.into_parts();
            parts.status = report.classified.status;
            parts.headers.remove(header::CONTENT_LENGTH);
            parts
                .headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Response::from_parts(parts, Body::from(body))
        }
        Err(e) => {
            tracing::error!(error = %e, path = %summary.path, "failed to serialize error envelope");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

fn render(report: &ErrorReport, summary: &RequestSummary, environment: Environment) -> serde_json::Result<Vec<u8>> {
    let classified = &report.classified;
    let development = environment.is_development();

    let envelope = Envelope {
        success: false,
        error: EnvelopeError {
            code: classified.code.as_str(),
            message: &classified.message,
            stack: development.then_some(report.trace.as_str()),
            details: classified.details.as_ref().filter(|_| development),
        },
        timestamp: format!("{:.3}", jiff::Timestamp::now()),
        path: &summary.path,
    };

    serde_json::to_vec(&envelope)
}

fn log_failure(report: &ErrorReport, summary: &RequestSummary, environment: Environment) {
    let classified = &report.classified;
    let ip = summary.client_ip.as_deref().unwrap_or("unknown");
    let user_agent = summary.user_agent.as_deref().unwrap_or("");

    if environment.is_development() {
        tracing::error!(
            error_message = %classified.message,
            stack = %report.trace,
            status = classified.status.as_u16(),
            code = %classified.code,
            method = %summary.method,
            path = %summary.path,
            ip,
            user_agent,
            "request failed"
        );
    } else if classified.status.is_server_error() {
        tracing::error!(
            status = classified.status.as_u16(),
            code = %classified.code,
            method = %summary.method,
            path = %summary.path,
            "request failed"
        );
    } else {
        tracing::debug!(
            status = classified.status.as_u16(),
            code = %classified.code,
            path = %summary.path,
            "request rejected"
        );
    }
}
