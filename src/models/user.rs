use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::image::{ImageInput, ImageRef};

/// Access role of a user.
/// Corresponds to the `user_role` SQL enum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

/// A user account as stored and returned by the API.
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar: Option<ImageRef>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Builds a new user with a fresh id and no avatar.
    /// The email is normalized to lower case.
    pub fn new(email: &str, name: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            name,
            password_hash,
            avatar: None,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name used for files this user owns in the image store.
    pub fn display_name(&self) -> &str {
        &self.name
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Payload for `POST /api/user`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[serde(default)]
    pub avatar: ImageInput,
}

/// Payload for `PUT /api/user/{id}`. Missing fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    #[serde(default)]
    pub avatar: ImageInput,
}
