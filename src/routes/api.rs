use crate::{handlers::{background_get, background_upload, diagnostics, health_check, ready_check}, state::AppState};
use axum::{routing::{get, post}, Router};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes() -> Router<Arc<AppState>> {
    Router::<Arc<AppState>>::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/v1/diagnostics", get(diagnostics))
        .route("/v1/background", post(background_upload))
        .route("/v1/background/:id", get(background_get))
}
