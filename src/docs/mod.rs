use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready, with its storage backend", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Diagram diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Live diagram statistics", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Upload a background image
#[utoipa::path(
    post,
    path = "/api/v1/background",
    request_body(content = String, description = "Raw image bytes", content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Background stored and announced to all clients", body = BackgroundUploadResponse),
        (status = 400, description = "Empty upload", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn background_upload_doc() {}

/// Fetch the current background image
#[utoipa::path(
    get,
    path = "/api/v1/background/{id}",
    params(
        ("id" = String, Path, description = "Background id announced in BackgroundUpdated")
    ),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Not the current background", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn background_get_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        background_upload_doc,
        background_get_doc,
    ),
    components(
        schemas(HealthResponse, DiagnosticsResponse, BackgroundUploadResponse, ErrorResponse, Shape)
    ),
    tags(
        (name = "api", description = "Whiteboard API endpoints")
    )
)]
pub struct ApiDoc;
