mod models;
mod handlers;
mod routes;
mod docs;
mod config;
mod db;
mod websocket;
mod diagram;
mod broadcast;
mod session;
mod hub;
mod persistence;
mod state;

use std::sync::Arc;
use axum::http::HeaderValue;
use tower_http::cors::CorsLayer;
use config::Config;
use tracing::{info, error, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use std::panic;
use db::pgstore::PgStore;
use persistence::{MemoryStore, PersistenceWriter, StorageBackend};
use routes::create_app;
use state::AppState;

#[tokio::main]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Load configuration before tracing so LOG_LEVEL can set the default filter
    let loaded = Config::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::try_new(config.default_log_filter()).unwrap_or_else(|_| EnvFilter::new("info"))
        }))
        .init();

    info!("Starting server...");

    match &loaded {
        Ok(_) => info!("✅ Configuration loaded successfully"),
        Err(e) => {
            error!("❌ Failed to load configuration: {}", e);
            warn!("Using default configuration");
        }
    }
    if config.is_development() {
        info!("Running in development mode");
    }

    // Pick the storage backend shapes and chat are recorded to
    let backend = open_storage(&config).await;
    let writer = PersistenceWriter::new(backend, config.retry_policy());

    // One shared diagram for every connection
    let app_state = AppState::new(writer);

    let mut app_routes = create_app(app_state);
    let origins: Vec<HeaderValue> = config
        .cors_origin_list()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if !origins.is_empty() {
        app_routes = app_routes.layer(CorsLayer::new().allow_origin(origins));
    }

    // Start the HTTP/WebSocket server
    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("🚀 Server running on http://{}", config.server_address());
    info!("📡 WebSocket available at ws://{}/draw", config.server_address());
    info!("📚 Swagger UI available at http://{}/swagger", config.server_address());

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}

/// Connect to Postgres when configured, otherwise keep records in memory
async fn open_storage(config: &Config) -> Arc<dyn StorageBackend> {
    let Some(db_url) = &config.db_url else {
        warn!("No database URL configured - shapes and chat will only be kept in memory");
        return Arc::new(MemoryStore::new());
    };

    match PgStore::connect(db_url, config.db_max_connections).await {
        Ok(store) => {
            if let Err(e) = store.ensure_schema().await {
                error!("Failed to prepare database schema: {}", e);
            }
            info!("Database initialized successfully");
            Arc::new(store)
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            warn!("Falling back to in-memory storage");
            Arc::new(MemoryStore::new())
        }
    }
}
