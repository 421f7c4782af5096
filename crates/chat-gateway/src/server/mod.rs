//! Gateway server setup
//!
//! Provides the main WebSocket server configuration and routes.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chat_cache::{MemoryDirectory, RedisDirectory, RedisPool};
use chat_common::{AppConfig, AppError, DirectoryBackend};
use chat_core::DirectoryStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
///
/// The WebSocket upgrade is served on both `/` and `/gateway`.
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/", get(gateway_handler))
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
        .route("/users", get(list_users))
}

/// Health check endpoint
async fn health_check(State(state): State<GatewayState>) -> impl IntoResponse {
    match state.directory().health_check().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::warn!(error = %e, "Directory health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "directory unavailable")
        }
    }
}

/// Current roster
async fn list_users(State(state): State<GatewayState>) -> impl IntoResponse {
    match state.directory().list_users().await {
        Ok(users) => Json(users).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, code = e.code(), "Failed to list users");
            (StatusCode::SERVICE_UNAVAILABLE, "directory unavailable").into_response()
        }
    }
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the configured directory backend
pub fn create_directory(config: &AppConfig) -> Result<Arc<dyn DirectoryStore>, AppError> {
    match config.directory {
        DirectoryBackend::Memory => {
            if config.app.env.is_production() {
                tracing::warn!("In-memory directory in production, roster is lost on restart");
            } else {
                tracing::info!("Using in-memory directory");
            }
            Ok(Arc::new(MemoryDirectory::new()))
        }
        DirectoryBackend::Redis => {
            let redis = config
                .redis
                .as_ref()
                .ok_or_else(|| AppError::Config("REDIS_URL is required for the redis directory".to_string()))?;
            let pool = RedisPool::from_config(redis).map_err(AppError::cache)?;
            Ok(Arc::new(RedisDirectory::new(pool)))
        }
    }
}

/// Initialize all dependencies and create `GatewayState`
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    let directory = create_directory(&config)?;

    // The pool connects lazily; report an unreachable store early but keep serving
    if let Err(e) = directory.health_check().await {
        tracing::warn!(error = %e, "Directory not reachable at startup");
    }

    Ok(GatewayState::new(directory, config))
}

/// Run the gateway server on an already-bound listener
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), AppError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Gateway listening on ws://{}/", addr);
    }

    axum::serve(listener, app).await.map_err(AppError::Server)
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: &str) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr).await.map_err(|source| AppError::Bind {
        addr: addr.to_string(),
        source,
    })?;

    serve(listener, app).await
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.gateway.address();

    // Create gateway state
    let state = create_gateway_state(config).await?;

    // Build application
    let app = create_app(state);

    // Run server
    run_server(app, &addr).await
}
