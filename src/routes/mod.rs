pub mod api;

use crate::{docs::ApiDoc, state::AppState, websocket::websocket_handler};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use api::create_api_routes;

/// Assemble the whole service: REST API, Swagger UI and the drawing websocket
pub fn create_app(app_state: Arc<AppState>) -> Router {
    Router::new()
        // Mount API routes
        .nest("/api", create_api_routes())
        // Clients join the whiteboard here
        .route("/draw", get(websocket_handler))
        .with_state(app_state)
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}
