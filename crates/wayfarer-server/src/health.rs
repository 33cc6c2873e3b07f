use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    status: &'static str,
    timestamp: String,
    /// Seconds since the server started
    uptime: f64,
    environment: String,
}

/// Health check handler
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        timestamp: format!("{:.3}", jiff::Timestamp::now()),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.environment.to_string(),
    })
}
