/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` holds:
 * - the server configuration
 * - the project registry (`Arc<RwLock<ProjectRegistry>>`)
 * - the store adapter
 * - the room hub for realtime fan-out
 * - the identity verifier
 * - the lifecycle and gallery services built on top of those
 *
 * Every field is cheap to clone; clones share the same underlying state.
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::auth::{IdentityVerifier, JwtVerifier};
use crate::backend::gallery::GalleryService;
use crate::backend::lifecycle::LifecycleManager;
use crate::backend::realtime::broadcast::RoomHub;
use crate::backend::registry::{ProjectRegistry, SharedRegistry};
use crate::backend::store::ProjectStoreAdapter;
use crate::shared::{Project, ServerConfig, ServerMessage};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,

    /// Active projects, the live editing state
    pub registry: SharedRegistry,

    pub store: ProjectStoreAdapter,

    /// Room and global broadcast channels
    pub hub: RoomHub,

    pub verifier: Arc<dyn IdentityVerifier>,

    pub lifecycle: LifecycleManager,

    pub gallery: GalleryService,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        registry: ProjectRegistry,
        store: ProjectStoreAdapter,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let registry = registry.into_shared();
        let lifecycle = LifecycleManager::new(
            registry.clone(),
            store.clone(),
            verifier.clone(),
            config.lenient_timers,
        );
        let gallery = GalleryService::new(store.clone(), verifier.clone());
        let hub = RoomHub::new(config.room_capacity);

        Self {
            config: Arc::new(config),
            registry,
            store,
            hub,
            verifier,
            lifecycle,
            gallery,
        }
    }

    /// Build state over `store`, bulk loading the registry from it and
    /// verifying tokens with the configured secret.
    ///
    /// A failed load is logged and leaves the registry empty.
    pub async fn from_store(config: ServerConfig, store: ProjectStoreAdapter) -> Self {
        let registry = match ProjectRegistry::load(&store).await {
            Ok(registry) => registry,
            Err(e) => {
                tracing::error!("[Registry] Failed to load active projects: {}", e);
                tracing::warn!("[Registry] Starting with an empty registry");
                ProjectRegistry::new()
            }
        };
        let verifier: Arc<dyn IdentityVerifier> = Arc::new(JwtVerifier::new(config.jwt_secret.clone()));
        Self::new(config, registry, store, verifier)
    }

    /// Copy of every active project
    pub async fn projects_snapshot(&self) -> Vec<Project> {
        self.registry.read().await.projects().to_vec()
    }

    /// Send the current project list to every connection
    pub async fn broadcast_projects(&self) -> usize {
        let projects = self.projects_snapshot().await;
        self.hub.broadcast_global(ServerMessage::Projects { projects })
    }
}

impl FromRef<AppState> for SharedRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

impl FromRef<AppState> for GalleryService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.gallery.clone()
    }
}
