use crate::config::AuthConfig;
use crate::error::AppError;
use crate::models::{Role, User};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's id.
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch) for the token.
    pub exp: usize,
}

/// Generates a signed JWT for `user`, valid for `config.token_ttl`.
///
/// # Returns
/// A `Result` containing the JWT string if successful.
/// Returns `AppError::InternalServerError` if the expiry overflows or encoding fails.
pub fn generate_token(user: &User, config: &AuthConfig) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(config.token_ttl)
        .ok_or_else(|| AppError::InternalServerError("Token lifetime out of range".into()))?;

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies a JWT string and decodes its claims.
///
/// Default validation checks are applied (signature, expiration).
/// Returns `AppError::Unauthorized` if the token is malformed, its signature is invalid,
/// or it has expired.
pub fn verify_token(token: &str, config: &AuthConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}
