/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server.
 *
 * # Initialization Process
 *
 * 1. Open the database (if configured) and pick the store backend
 * 2. Bulk load every active project into the registry
 * 3. Report projects left without a permission grant
 * 4. Start the periodic room cleanup task
 * 5. Create and configure the router
 *
 * Only a configuration error stops startup. An unreachable database, failed
 * migrations or a failed registry load are logged and the server starts
 * with what it has.
 */

use axum::Router;
use std::time::Duration;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, select_store};
use crate::backend::server::state::AppState;
use crate::shared::ServerConfig;

/// Create and configure the Axum application
pub async fn create_app(config: ServerConfig) -> Router<()> {
    tracing::info!("Initializing PixelCollab backend server");

    let pool = load_database(&config).await;
    let store = select_store(pool);
    tracing::info!("[Store] Using {} store", store.backend_tag());

    let app_state = AppState::from_store(config, store).await;

    if let Err(e) = app_state.store.audit_orphaned_projects().await {
        tracing::error!("[Store] Orphan audit failed: {}", e);
    }

    spawn_room_cleanup(&app_state);

    let app = create_router(app_state);
    tracing::info!("Router configured with periodic cleanup task");
    app
}

/// Periodically drop room channels nobody listens to
pub fn spawn_room_cleanup(app_state: &AppState) -> tokio::task::JoinHandle<()> {
    let hub = app_state.hub.clone();
    let period = Duration::from_secs(app_state.config.cleanup_interval_secs);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let removed = hub.cleanup_inactive_rooms();
            tracing::debug!(
                "[Realtime] Cleaned up {} inactive room(s), {} remain",
                removed,
                hub.room_count()
            );
        }
    })
}
