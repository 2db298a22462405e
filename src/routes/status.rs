use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::info;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since the server started.
    pub uptime: f64,
}

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub error: &'static str,
}

pub async fn root() -> &'static str {
    info!("hello from acquisitions");
    "Hello from Acquisitions"
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

pub async fn api_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Acquisition api is running" }))
}

pub async fn not_found() -> (StatusCode, Json<ErrorMessage>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorMessage {
            error: "Route not found",
        }),
    )
}
