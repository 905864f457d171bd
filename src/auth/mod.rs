pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

/// Represents the payload for a user login request.
///
/// Not validated: any credential that does not match a stored account is rejected
/// the same way, with 401.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// User's email address, matched case-insensitively.
    pub email: String,
    pub password: String,
}

/// Body of a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// The JWT (JSON Web Token) to send as `Authorization: Bearer <token>`.
    pub token: String,
}
