/**
 * Authentication Middleware
 *
 * This module protects routes that require a caller identity. It reads the
 * bearer token from the Authorization header, verifies it with the
 * `IdentityVerifier` in `AppState`, and hands the resulting `Identity` to
 * handlers.
 *
 * - `auth_middleware` rejects requests without a valid token (401) and
 *   stores the identity in the request extensions
 * - `AuthUser` extracts that identity in handlers
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::backend::auth::Identity;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Bearer token from the Authorization header, if present and well formed
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authenticate(headers: &HeaderMap, app_state: &AppState) -> Result<Identity, BackendError> {
    let token = bearer_token(headers).ok_or_else(|| {
        tracing::warn!("Missing or malformed Authorization header");
        BackendError::unauthorized("missing bearer token")
    })?;

    app_state.verifier.verify(token).map_err(|e| {
        tracing::warn!("Invalid token: {}", e);
        BackendError::unauthorized("invalid bearer token")
    })
}

/// Authentication middleware
///
/// Returns 401 Unauthorized if the token is missing or invalid.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let identity = authenticate(request.headers(), &app_state)?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Axum extractor for an authenticated caller
///
/// Uses the identity attached by `auth_middleware` when present, otherwise
/// verifies the Authorization header itself.
#[derive(Clone, Debug)]
pub struct AuthUser(pub Identity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(AuthUser(identity.clone()));
        }
        authenticate(&parts.headers, state).map(AuthUser)
    }
}
