use crate::{
    models::{BackgroundUploadResponse, ErrorResponse},
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

/// Upload a new background image for the diagram
pub async fn background_upload(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<BackgroundUploadResponse>), (StatusCode, Json<ErrorResponse>)> {
    if body.is_empty() {
        error!("Rejected empty background upload");
        return Err(ErrorResponse::reply(
            StatusCode::BAD_REQUEST,
            "Background image must not be empty",
        ));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let background = app_state.hub.set_background(content_type, body.to_vec());
    info!("Background '{}' uploaded", background.id);

    Ok((
        StatusCode::CREATED,
        Json(BackgroundUploadResponse {
            id: background.id.clone(),
        }),
    ))
}

/// Fetch the current background image by id
pub async fn background_get(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    match app_state.hub.diagram().background() {
        Some(background) if background.id == id => Ok((
            [(header::CONTENT_TYPE, background.content_type.clone())],
            background.content.clone(),
        )
            .into_response()),
        _ => Err(ErrorResponse::reply(
            StatusCode::NOT_FOUND,
            format!("Background '{}' not found", id),
        )),
    }
}
