/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Realtime and health routes
 * 2. API routes (projects, gallery)
 * 3. Fallback handler (404)
 */

use axum::{http::StatusCode, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::backend::error::BackendError;
use crate::backend::realtime::handle_socket_upgrade;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Liveness probe (GET /health)
async fn health() -> StatusCode {
    StatusCode::OK
}

async fn not_found() -> BackendError {
    BackendError::not_found("404 Not Found")
}

/// Create the Axum router with all routes configured
///
/// - `GET /ws` - WebSocket upgrade for realtime editing
/// - `GET /health` - Liveness probe
/// - `/api/...` - see `api_routes`
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new()
        .route("/ws", get(handle_socket_upgrade))
        .route("/health", get(health));

    let router = configure_api_routes(router, &app_state);

    router
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
