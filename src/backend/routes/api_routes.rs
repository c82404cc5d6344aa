/**
 * API Route Handlers
 *
 * # Routes
 *
 * ## Projects
 * - `GET /api/projects` - Active project summaries
 * - `POST /api/projects` - Create a project (bearer token)
 * - `GET /api/projects/{id}` - One project, live grid if active
 * - `DELETE /api/projects/{id}` - Delete a never-finished project (grant)
 * - `POST /api/projects/{id}/save` - Persist the live grid (grant)
 * - `POST /api/projects/{id}/finish` - Finish a project (grant)
 * - `PUT /api/projects/{id}/public` - Publish a project (grant)
 * - `POST /api/projects/{id}/permissions` - Grant access (grant)
 * - `DELETE /api/projects/{id}/permissions/{user_id}` - Revoke access (grant)
 *
 * ## Gallery
 * - `GET /api/gallery?sort=` - Sorted gallery view
 * - `PUT /api/gallery/{id}/rating` - Rate (bearer token)
 * - `DELETE /api/gallery/{id}/rating` - Withdraw rating (bearer token)
 * - `POST /api/gallery/{id}/flags` - Flag (bearer token)
 *
 * Paths where every method needs a caller sit behind `auth_middleware`.
 * The remaining protected methods share a path with public ones and
 * authenticate through the `AuthUser` extractor.
 */

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::backend::gallery::handlers as gallery;
use crate::backend::middleware::auth_middleware;
use crate::backend::projects;
use crate::backend::server::state::AppState;

/// Configure API routes
pub fn configure_api_routes(router: Router<AppState>, app_state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/projects/{id}/save", post(projects::save_project))
        .route("/api/projects/{id}/finish", post(projects::finish_project))
        .route("/api/projects/{id}/public", put(projects::set_public))
        .route("/api/projects/{id}/permissions", post(projects::grant_permission))
        .route(
            "/api/projects/{id}/permissions/{user_id}",
            delete(projects::revoke_permission),
        )
        .route(
            "/api/gallery/{id}/rating",
            put(gallery::rate_project).delete(gallery::delete_rating),
        )
        .route("/api/gallery/{id}/flags", post(gallery::flag_project))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware));

    router
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(projects::get_project).delete(projects::delete_project),
        )
        .route("/api/gallery", get(gallery::list_gallery))
        .merge(protected)
}
