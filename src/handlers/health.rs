use std::sync::Arc;
use axum::{extract::State, Json};
use crate::models::HealthResponse;
use crate::state::AppState;
use tracing::debug;

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
        storage: None,
    })
}

/// Readiness check endpoint, reporting which storage shapes are recorded to
pub async fn ready_check(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Readiness check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Service is ready".to_string(),
        storage: Some(app_state.hub.writer().backend_kind().to_string()),
    })
}
