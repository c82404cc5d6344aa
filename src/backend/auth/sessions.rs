/**
 * Bearer Tokens
 *
 * This module maps opaque bearer tokens to user identities. Tokens are HS256
 * JWTs whose `sub` claim is the user's UUID and whose `name` claim is the
 * display name shown as project owner.
 *
 * Issuing tokens belongs to the external identity service; `create_token`
 * exists for tooling and tests that need a valid token signed with the same
 * secret.
 */

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token lifetime used by `create_token`: 30 days
const TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// A verified caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub name: String,
}

/// Token verification failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("invalid user id in token: {0}")]
    InvalidSubject(String),
}

/// Maps a bearer token to the identity it was issued for
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// HS256 JWT verifier
#[derive(Clone)]
pub struct JwtVerifier {
    secret: String,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    /// Sign a token for `user_id` with this verifier's secret
    pub fn create_token(&self, user_id: Uuid, name: &str) -> Result<String, jsonwebtoken::errors::Error> {
        create_token(&self.secret, user_id, name)
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = verify_token(&self.secret, token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|e| AuthError::InvalidSubject(e.to_string()))?;
        Ok(Identity {
            user_id,
            name: claims.name,
        })
    }
}

/// Create a JWT token for a user
pub fn create_token(secret: &str, user_id: Uuid, name: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        name: name.to_string(),
        exp: now + TOKEN_TTL_SECS,
        iat: now,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key)
}

/// Verify and decode a JWT token
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &key, &Validation::default())?;
    Ok(token_data.claims)
}
