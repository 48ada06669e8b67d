use crate::{models::DiagnosticsResponse, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::info;

/// Report the size of the live diagram and its audience
pub async fn diagnostics(
    State(app_state): State<Arc<AppState>>,
) -> (StatusCode, Json<DiagnosticsResponse>) {
    let diagram = app_state.hub.diagram();
    let n_shapes = diagram.shape_count();
    let n_users = diagram.user_count();
    let n_conn = app_state.hub.dispatcher().connection_count();
    let has_background = diagram.background().is_some();

    info!(
        "Diagnostics: Shapes: {}, Users: {}, Conn: {}, Background: {}",
        n_shapes, n_users, n_conn, has_background
    );

    (
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_shapes,
            n_users,
            n_conn,
            has_background,
        }),
    )
}
